use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a file lives, independent of what it contains.
///
/// Compared field-by-field and case-sensitively; paths are taken as walked,
/// without canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileIdentity {
    #[serde(rename = "dir")]
    pub directory: String,
    pub name: String,
}

impl FileIdentity {
    pub fn new(directory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
        }
    }

    /// Split a path into parent directory and file name.
    /// Returns `None` for paths without a file name (`/`, `..`) and for paths
    /// that aren't valid UTF-8, which can't be stored without merging
    /// distinct names.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let directory = match path.parent() {
            Some(parent) => parent.to_str()?.to_string(),
            None => String::new(),
        };
        Some(Self { directory, name })
    }

    pub fn path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.name)
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// A newly seen file whose content was already registered under another identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub duplicate: FileIdentity,
    pub original: FileIdentity,
}

impl DuplicateRecord {
    pub fn new(duplicate: FileIdentity, original: FileIdentity) -> Self {
        Self {
            duplicate,
            original,
        }
    }
}

impl fmt::Display for DuplicateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is a duplicate of {}", self.duplicate, self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_path() {
        let identity = FileIdentity::from_path(Path::new("photos/2024/img.jpg")).unwrap();
        assert_eq!(identity.directory, "photos/2024");
        assert_eq!(identity.name, "img.jpg");
        assert_eq!(identity.path(), PathBuf::from("photos/2024/img.jpg"));
    }

    #[test]
    fn test_identity_without_parent() {
        let identity = FileIdentity::from_path(Path::new("notes.txt")).unwrap();
        assert_eq!(identity.directory, "");
        assert_eq!(identity.to_string(), "notes.txt");
        assert!(FileIdentity::from_path(Path::new("/")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_have_no_identity() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let bad_name = Path::new("/data").join(OsStr::from_bytes(b"a\xff"));
        assert!(FileIdentity::from_path(&bad_name).is_none());

        let bad_dir = Path::new(OsStr::from_bytes(b"/data\xfe")).join("a.txt");
        assert!(FileIdentity::from_path(&bad_dir).is_none());
    }

    #[test]
    fn test_identity_equality_is_case_sensitive() {
        assert_ne!(FileIdentity::new("/d", "A.txt"), FileIdentity::new("/d", "a.txt"));
        assert_ne!(FileIdentity::new("/D", "a.txt"), FileIdentity::new("/d", "a.txt"));
        assert_eq!(FileIdentity::new("/d", "a.txt"), FileIdentity::new("/d", "a.txt"));
    }

    #[test]
    fn test_identity_serializes_with_dir_key() {
        let json = serde_json::to_value(FileIdentity::new("/data", "a.txt")).unwrap();
        assert_eq!(json, serde_json::json!({"dir": "/data", "name": "a.txt"}));
    }

    #[cfg(unix)]
    #[test]
    fn test_record_display() {
        let record = DuplicateRecord::new(
            FileIdentity::new("/data/b", "copy.txt"),
            FileIdentity::new("/data/a", "orig.txt"),
        );
        assert_eq!(
            record.to_string(),
            "/data/b/copy.txt is a duplicate of /data/a/orig.txt"
        );
    }
}
