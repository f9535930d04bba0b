use super::models::FileIdentity;
use crate::error::Error;
use crate::hasher::Fingerprint;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Result of `Registry::insert_if_absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An entry already existed and was left untouched.
    Existing(FileIdentity),
}

impl InsertOutcome {
    pub fn inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }

    pub fn existing(&self) -> Option<&FileIdentity> {
        match self {
            InsertOutcome::Inserted => None,
            InsertOutcome::Existing(identity) => Some(identity),
        }
    }
}

/// Durable fingerprint → first-seen identity map.
///
/// Loaded once per run, shared by reference between workers, persisted once
/// at the end. Check-and-set goes through the dashmap entry API, which holds
/// the key's shard lock for the whole decision.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    entries: DashMap<Fingerprint, FileIdentity>,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: DashMap::new(),
        }
    }

    /// Read persisted state from `path`.
    /// Missing, unreadable or malformed files all yield an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(Some(entries)) => {
                debug!(
                    "Loaded {} registry entries from {}",
                    entries.len(),
                    path.display()
                );
                entries
            }
            Ok(None) => {
                debug!("No registry at {}, starting empty", path.display());
                DashMap::new()
            }
            Err(e) => {
                error!(
                    "Error decoding registry {}: {}. Starting with an empty registry",
                    path.display(),
                    e
                );
                DashMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<FileIdentity> {
        self.entries.get(fingerprint).map(|entry| entry.value().clone())
    }

    pub fn insert_if_absent(
        &self,
        fingerprint: Fingerprint,
        identity: FileIdentity,
    ) -> InsertOutcome {
        self.insert_if_absent_with(fingerprint, identity, |_| {})
    }

    /// Check-and-set that also runs `on_existing` against the stored identity
    /// before the entry lock is released. Anything another worker does with
    /// the same fingerprint is ordered strictly before or after it.
    pub fn insert_if_absent_with<F>(
        &self,
        fingerprint: Fingerprint,
        identity: FileIdentity,
        on_existing: F,
    ) -> InsertOutcome
    where
        F: FnOnce(&FileIdentity),
    {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                on_existing(existing);
                InsertOutcome::Existing(existing.clone())
            }
            Entry::Vacant(entry) => {
                entry.insert(identity);
                InsertOutcome::Inserted
            }
        }
    }

    /// Snapshot of all entries, ordered by fingerprint.
    pub fn entries(&self) -> Vec<(Fingerprint, FileIdentity)> {
        self.sorted().into_iter().collect()
    }

    pub fn persist(&self) -> Result<(), Error> {
        self.persist_to(&self.path)
    }

    /// Write the full mapping as pretty JSON, replacing whatever was there.
    /// The new content goes to a sibling temp file first and is renamed into
    /// place, so a failed write leaves the previous registry intact.
    pub fn persist_to(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(&self.sorted())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = temp_path_for(path);
        if let Err(e) = fs::write(&tmp_path, json).and_then(|_| fs::rename(&tmp_path, path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(
            "Persisted {} registry entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Delete the persisted registry at `path`. Returns whether a file existed.
    pub fn clear(path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn sorted(&self) -> BTreeMap<Fingerprint, FileIdentity> {
        self.entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

fn read_entries(path: &Path) -> Result<Option<DashMap<Fingerprint, FileIdentity>>, Error> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let parsed: HashMap<Fingerprint, FileIdentity> = serde_json::from_str(&text)?;
    Ok(Some(parsed.into_iter().collect()))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
