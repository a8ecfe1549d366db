//! Temporary File Storage
//!
//! Scratch directory for uploads and compressed output. Every file placed here
//! belongs to exactly one request and is removed when that request finishes.

pub mod temp_files;
pub mod temp_store;

pub use temp_files::TempFiles;
pub use temp_store::{ensure_directory, exists, remove, TempFileStore};
