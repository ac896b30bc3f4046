//! Daemon error types.

use thiserror::Error;

/// Errors from the daemon lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// The daemon was shut down deliberately.
    ///
    /// [`Daemon::start`](crate::Daemon::start) returns this after
    /// [`Daemon::close`](crate::Daemon::close) so callers can tell an
    /// intentional shutdown from a listener fault.
    #[error("server closed")]
    Closed,

    /// Binding or accepting on the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
