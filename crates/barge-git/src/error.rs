//! Git protocol error types.

use thiserror::Error;

/// Errors that can occur while speaking the git wire protocol.
#[derive(Debug, Error)]
pub enum GitError {
    /// Invalid pkt-line format.
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    /// Structurally malformed daemon request payload.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Request named a service this daemon does not know.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-facing errors whose wire text is contractual.
///
/// Stock git clients surface these payloads verbatim and compatibility tests
/// assert on the exact bytes, so the strings must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    /// A connection idled out, or hit its lifetime ceiling, before
    /// negotiation produced any output.
    #[error("I/O timeout reached")]
    Timeout,

    /// Unknown repository, denied access, or disallowed service. One message
    /// for all three, so probing cannot tell them apart.
    #[error("invalid repo")]
    InvalidRepo,

    /// The opening request did not parse.
    #[error("invalid request")]
    InvalidRequest,
}
