use crate::storage::DuplicateRecord;
use std::path::Path;

/// Trait for reporting scan progress.
///
/// Called concurrently from worker threads. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_file_processed(&self, _files_processed: usize, _path: &Path) {}
    fn on_duplicate(&self, _record: &DuplicateRecord) {}
    fn on_scan_complete(&self, _files_processed: usize, _duplicates: usize, _duration_secs: f64) {}
    fn on_persist_start(&self) {}
    fn on_persist_complete(&self, _entries: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
