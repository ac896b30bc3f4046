//! Backend error types.

use thiserror::Error;

/// Errors from repository resolution.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The repository does not exist, is not a bare repository, or is not
    /// exported to anonymous clients. One variant for all of them; the
    /// distinction stays inside the backend.
    #[error("repository not found: {0}")]
    NotFound(String),

    /// I/O error while inspecting the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
