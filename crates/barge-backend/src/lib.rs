//! Repository store boundary for the Barge daemon.
//!
//! The daemon resolves client-supplied repository paths through the
//! [`Backend`] trait and proceeds only when the reported anonymous access
//! level is at least read-only. [`FsBackend`] is the production store;
//! [`MemoryBackend`] backs tests.

mod access;
mod backend;
mod error;
mod fs;
mod repository;

pub use access::AccessLevel;
pub use backend::{Backend, MemoryBackend};
pub use error::BackendError;
pub use fs::{FsBackend, EXPORT_OK_FILE};
pub use repository::{sanitize_name, Repository};

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
