use super::Fingerprint;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

pub const HASH_CHUNK_SIZE: usize = 8 * 1024; // 8KB

/// Stream a file through SHA-256 in `HASH_CHUNK_SIZE` chunks.
/// Open and mid-stream read failures are returned to the caller.
pub fn compute_fingerprint(file: &Path) -> io::Result<Fingerprint> {
    let f = File::open(file)?;
    fingerprint_reader(f)
}

pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    let digest = hasher.finalize();
    let mut bytes = [0u8; Fingerprint::LEN];
    bytes.copy_from_slice(&digest);
    Ok(Fingerprint::from_bytes(bytes))
}
