//! Git wire-protocol primitives for Barge.
//!
//! This crate implements the pkt-line framing shared by all git transports
//! and the opening request dialect of the `git://` daemon protocol, so the
//! daemon can parse handshakes and answer with errors that stock git
//! clients understand.

mod error;
mod pktline;
mod request;
mod service;

pub use error::{GitError, WireError};
pub use pktline::{Packet, PktLineReader, PktLineWriter, MAX_PACKET_LENGTH};
pub use request::DaemonRequest;
pub use service::Service;

/// Result type for git protocol operations.
pub type Result<T> = std::result::Result<T, GitError>;
