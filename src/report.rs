use crate::storage::DuplicateRecord;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

/// Collects duplicates found during one scan and mirrors each one to the
/// cumulative duplicates log as it arrives.
///
/// A single mutex guards both the in-memory sequence and the log file, so the
/// two stay in the same order.
pub struct DuplicateReporter {
    state: Mutex<ReporterState>,
}

struct ReporterState {
    records: Vec<DuplicateRecord>,
    log: LogTarget,
    log_failures: usize,
}

enum LogTarget {
    /// No log was requested.
    Memory,
    /// A log was requested but could not be opened.
    Unavailable(PathBuf),
    File(DuplicateLog),
}

struct DuplicateLog {
    path: PathBuf,
    writer: Box<dyn Write + Send>,
}

impl DuplicateLog {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Box::new(file),
        })
    }

    fn append(&mut self, record: &DuplicateRecord) -> io::Result<()> {
        writeln!(self.writer, "Duplicate found: {}", record)?;
        self.writer.flush()
    }
}

impl DuplicateReporter {
    /// Reporter that appends to the log at `log_path`. If the log can't be
    /// opened the reporter still collects records in memory, and every record
    /// counts as a log failure.
    pub fn open(log_path: impl AsRef<Path>) -> Self {
        let log_path = log_path.as_ref();
        let log = match DuplicateLog::open(log_path) {
            Ok(log) => {
                debug!("Appending duplicates to {}", log_path.display());
                LogTarget::File(log)
            }
            Err(e) => {
                error!(
                    "Unable to open duplicates log {}: {}. Duplicates will only be kept in memory",
                    log_path.display(),
                    e
                );
                LogTarget::Unavailable(log_path.to_path_buf())
            }
        };
        Self::with_log(log)
    }

    pub fn in_memory() -> Self {
        Self::with_log(LogTarget::Memory)
    }

    fn with_log(log: LogTarget) -> Self {
        Self {
            state: Mutex::new(ReporterState {
                records: Vec::new(),
                log,
                log_failures: 0,
            }),
        }
    }

    pub fn report(&self, record: DuplicateRecord) {
        info!("Duplicate found: {}", record);

        let mut guard = self.lock();
        let state = &mut *guard;
        match &mut state.log {
            LogTarget::Memory => {}
            LogTarget::Unavailable(path) => {
                debug!(
                    "Duplicates log {} unavailable, record kept in memory",
                    path.display()
                );
                state.log_failures += 1;
            }
            LogTarget::File(log) => {
                if let Err(e) = log.append(&record) {
                    error!(
                        "Unable to append to duplicates log {}: {}",
                        log.path.display(),
                        e
                    );
                    state.log_failures += 1;
                }
            }
        }
        state.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records that made it into memory but not into the log.
    pub fn log_failures(&self) -> usize {
        self.lock().log_failures
    }

    pub fn snapshot(&self) -> Vec<DuplicateRecord> {
        self.lock().records.clone()
    }

    pub fn into_records(self) -> Vec<DuplicateRecord> {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .records
    }

    // Every mutation is a single push or increment, so a poisoned lock still
    // guards consistent state.
    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
