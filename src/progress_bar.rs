use dupe_ledger::{DuplicateRecord, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif spinners.
///
/// - Scan phase: spinner with running file/duplicate counts (total unknown
///   while the walk is still producing)
/// - Persist phase: spinner
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    duplicates: AtomicUsize,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            duplicates: AtomicUsize::new(0),
        }
    }

    fn spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &Path) {
        self.set_bar(Self::spinner(&format!("Scanning {}...", root.display())));
    }

    fn on_file_processed(&self, files_processed: usize, _path: &Path) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(format!(
                    "Hashing... {} files, {} duplicates",
                    files_processed,
                    self.duplicates.load(Ordering::Relaxed)
                ));
            }
        }
    }

    fn on_duplicate(&self, _record: &DuplicateRecord) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    fn on_scan_complete(&self, files_processed: usize, duplicates: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} files, {} duplicates in {:.2}s",
            files_processed, duplicates, duration_secs
        );
    }

    fn on_persist_start(&self) {
        self.set_bar(Self::spinner("Writing registry..."));
    }

    fn on_persist_complete(&self, entries: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Registry written: {} entries in {:.2}s",
            entries, duration_secs
        );
    }
}
