//! Anonymous `git://` protocol daemon.
//!
//! Serves the read-only git transfer services (`upload-pack` and
//! `upload-archive`) over bare TCP by relaying each connection to a `git`
//! subprocess. Push is always refused. Connections are bounded three ways:
//! an idle timer rearmed by traffic, an absolute lifetime ceiling, and a
//! global concurrency cap enforced at accept time.
//!
//! # Example
//!
//! ```no_run
//! use barge_backend::FsBackend;
//! use barge_backend::AccessLevel;
//! use barge_daemon::{Daemon, DaemonConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> barge_daemon::Result<()> {
//! let cfg = DaemonConfig::default();
//! let backend = FsBackend::new("/srv/git", AccessLevel::ReadOnly);
//! let daemon = Daemon::bind(cfg, Arc::new(backend)).await?;
//! daemon.start().await?;
//! # Ok(())
//! # }
//! ```

mod admission;
mod config;
mod daemon;
mod error;
mod handler;
mod process;
mod relay;

pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::Error;

/// Convenience result type for daemon operations.
pub type Result<T> = std::result::Result<T, Error>;
