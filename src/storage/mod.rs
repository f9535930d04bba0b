pub mod models;
pub mod registry;

pub use models::{DuplicateRecord, FileIdentity};
pub use registry::{InsertOutcome, Registry};
