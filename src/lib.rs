pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod storage;

pub use config::AppConfig;
pub use engine::{FileOutcome, ScanEngine, ScanResult};
pub use error::Error;
pub use hasher::Fingerprint;
pub use progress::{ProgressReporter, SilentReporter};
pub use report::DuplicateReporter;
pub use storage::{DuplicateRecord, FileIdentity, InsertOutcome, Registry};
