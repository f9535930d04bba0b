use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher;
use crate::progress::ProgressReporter;
use crate::report::DuplicateReporter;
use crate::scanner;
use crate::storage::{DuplicateRecord, FileIdentity, InsertOutcome, Registry};
use config::ConfigError;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct ScanEngine {
    config: AppConfig,
    shutdown: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ScanResult {
    /// Duplicates found in this run, in commit order.
    pub duplicates: Vec<DuplicateRecord>,
    pub files_seen: usize,
    pub files_novel: usize,
    pub files_known: usize,
    pub files_failed: usize,
    pub registry_entries: usize,
    pub log_failures: usize,
    pub interrupted: bool,
    pub scan_duration: Duration,
    pub persist_duration: Duration,
    /// Set when the registry could not be written; the duplicates above are
    /// still valid.
    pub persist_error: Option<String>,
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// First time this content was seen; registered under this identity.
    Novel,
    /// Content already registered under this same identity.
    Known,
    Duplicate(DuplicateRecord),
    /// Could not be read; nothing was registered.
    Failed,
}

#[derive(Default)]
struct ScanCounters {
    seen: AtomicUsize,
    novel: AtomicUsize,
    known: AtomicUsize,
    failed: AtomicUsize,
}

impl ScanCounters {
    fn record(&self, outcome: &FileOutcome) -> usize {
        let counter = match outcome {
            FileOutcome::Novel => Some(&self.novel),
            FileOutcome::Known => Some(&self.known),
            FileOutcome::Failed => Some(&self.failed),
            FileOutcome::Duplicate(_) => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
        self.seen.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_registry_path(mut self, path: &str) -> Self {
        self.config.database_path = path.to_string();
        self
    }

    pub fn with_duplicates_log_path(mut self, path: &str) -> Self {
        self.config.duplicates_log_path = path.to_string();
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = threads;
        self
    }

    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    /// Setting this flag stops new files from being dispatched. Files
    /// already being hashed finish, and the registry is still persisted.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Run one incremental scan:
    /// 1. Load the registry persisted by earlier runs
    /// 2. Walk the root and fingerprint every file on a bounded worker pool
    /// 3. Check-and-set each fingerprint, reporting duplicates as they commit
    /// 4. Persist the registry once every dispatched file has finished
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<ScanResult, Error> {
        let root = self.root_dir()?;
        info!("Directory to scan: {}", root.display());

        let registry = Registry::load(&self.config.database_path);
        let duplicates = DuplicateReporter::open(&self.config.duplicates_log_path);
        let ignore_patterns = scanner::compile_ignore_patterns(&self.config.ignore_patterns);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads)
            .thread_name(|i| format!("dupe-ledger-worker-{}", i))
            .build()?;
        debug!(
            "Worker pool started with {} threads, {} registry entries loaded",
            pool.current_num_threads(),
            registry.len()
        );

        let counters = ScanCounters::default();

        // Phase 1: Walk + hash + check-and-set
        reporter.on_scan_start(&root);
        let scan_start = Instant::now();
        pool.install(|| {
            scanner::regular_files(&root, &ignore_patterns)
                .take_while(|_| !self.shutdown_requested())
                .par_bridge()
                .for_each(|path| {
                    if self.shutdown_requested() {
                        return;
                    }
                    let outcome = process_file(&path, &registry, &duplicates);
                    if let FileOutcome::Duplicate(record) = &outcome {
                        reporter.on_duplicate(record);
                    }
                    let processed = counters.record(&outcome);
                    reporter.on_file_processed(processed, &path);
                });
        });
        let scan_duration = scan_start.elapsed();

        let interrupted = self.shutdown_requested();
        if interrupted {
            warn!("Emergency stop triggered. Persisting what has been found so far...");
        }
        let files_seen = ScanCounters::get(&counters.seen);
        reporter.on_scan_complete(files_seen, duplicates.len(), scan_duration.as_secs_f64());
        debug!(
            "Scan completed in {:.2}s: {} files, {} duplicates",
            scan_duration.as_secs_f64(),
            files_seen,
            duplicates.len(),
        );

        // Phase 2: Persist
        reporter.on_persist_start();
        let persist_start = Instant::now();
        let persist_error = match registry.persist() {
            Ok(()) => None,
            Err(e) => {
                error!(
                    "Unable to write registry to {}: {}",
                    registry.path().display(),
                    e
                );
                Some(e.to_string())
            }
        };
        let persist_duration = persist_start.elapsed();
        reporter.on_persist_complete(registry.len(), persist_duration.as_secs_f64());

        let log_failures = duplicates.log_failures();
        Ok(ScanResult {
            duplicates: duplicates.into_records(),
            files_seen,
            files_novel: ScanCounters::get(&counters.novel),
            files_known: ScanCounters::get(&counters.known),
            files_failed: ScanCounters::get(&counters.failed),
            registry_entries: registry.len(),
            log_failures,
            interrupted,
            scan_duration,
            persist_duration,
            persist_error,
        })
    }

    fn root_dir(&self) -> Result<PathBuf, Error> {
        if self.config.directory.trim().is_empty() {
            return Err(ConfigError::Message(
                "No directory path found in configuration".to_string(),
            )
            .into());
        }
        let root = PathBuf::from(&self.config.directory);
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Directory to scan does not exist: {}", root.display()),
            )
            .into());
        }
        Ok(root)
    }
}

/// Fingerprint one file and commit it to the registry.
///
/// The duplicate is reported while the registry entry is still locked, so
/// the reporter's order matches commit order for each fingerprint.
pub fn process_file(
    path: &Path,
    registry: &Registry,
    duplicates: &DuplicateReporter,
) -> FileOutcome {
    info!("Processing file: {}", path.display());

    let identity = match FileIdentity::from_path(path) {
        Some(identity) => identity,
        None => {
            error!(
                "Skipping '{}': path has no file name or is not valid UTF-8",
                path.display()
            );
            return FileOutcome::Failed;
        }
    };

    let fingerprint = match hasher::compute_fingerprint(path) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            error!("Error processing file '{}': {}", path.display(), e);
            return FileOutcome::Failed;
        }
    };

    let mut found = None;
    let outcome = registry.insert_if_absent_with(fingerprint, identity.clone(), |existing| {
        if *existing != identity {
            let record = DuplicateRecord::new(identity.clone(), existing.clone());
            duplicates.report(record.clone());
            found = Some(record);
        }
    });

    match (outcome, found) {
        (InsertOutcome::Inserted, _) => {
            info!("Finished processing file: {}", path.display());
            FileOutcome::Novel
        }
        (InsertOutcome::Existing(_), Some(record)) => FileOutcome::Duplicate(record),
        (InsertOutcome::Existing(_), None) => {
            info!("Already registered: {}", path.display());
            FileOutcome::Known
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_process_file_outcomes() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        let registry = Registry::new(tmp.path().join("db.json"));
        let duplicates = DuplicateReporter::in_memory();

        assert_eq!(process_file(&a, &registry, &duplicates), FileOutcome::Novel);
        assert_eq!(process_file(&a, &registry, &duplicates), FileOutcome::Known);
        match process_file(&b, &registry, &duplicates) {
            FileOutcome::Duplicate(record) => {
                assert_eq!(record.duplicate.name, "b.txt");
                assert_eq!(record.original.name, "a.txt");
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert_eq!(duplicates.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_process_missing_file_fails_without_registering() {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(tmp.path().join("db.json"));
        let duplicates = DuplicateReporter::in_memory();

        let outcome = process_file(&tmp.path().join("gone.txt"), &registry, &duplicates);
        assert_eq!(outcome, FileOutcome::Failed);
        assert!(registry.is_empty());
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_empty_directory_setting_is_rejected() {
        let engine = ScanEngine::new(AppConfig::default());
        let err = engine.scan(&crate::SilentReporter).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let tmp = tempdir().unwrap();
        let config = AppConfig {
            directory: tmp.path().join("absent").to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let err = ScanEngine::new(config).scan(&crate::SilentReporter).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
