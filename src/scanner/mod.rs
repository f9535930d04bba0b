pub mod walk;

pub use walk::{compile_ignore_patterns, regular_files};
