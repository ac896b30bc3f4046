//! Listener lifecycle and accept loop.

use crate::admission::ConnectionGate;
use crate::config::DaemonConfig;
use crate::error::Error;
use crate::handler;
use crate::Result;
use barge_backend::Backend;
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

const ACCEPT_BACKOFF_FLOOR: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_CEIL: Duration = Duration::from_secs(1);

/// The `git://` daemon: a TCP listener plus the connections it serves.
///
/// Binding and serving are split so callers can learn the bound address
/// (ports may be ephemeral) before the accept loop runs. The daemon is
/// shared behind an `Arc`: one task runs [`start`](Self::start) while
/// another calls [`close`](Self::close) to shut it down.
pub struct Daemon {
    cfg: Arc<DaemonConfig>,
    backend: Arc<dyn Backend>,
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    gate: ConnectionGate,
    shutdown: CancellationToken,
    handlers: TaskTracker,
}

impl Daemon {
    /// Binds the listener without accepting anything yet.
    pub async fn bind(cfg: DaemonConfig, backend: Arc<dyn Backend>) -> Result<Self> {
        let listener = TcpListener::bind(cfg.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        debug!(addr = %local_addr, "Bound git daemon listener");
        Ok(Self {
            gate: ConnectionGate::new(cfg.max_connections),
            cfg: Arc::new(cfg),
            backend,
            listener: Mutex::new(Some(listener)),
            local_addr,
            shutdown: CancellationToken::new(),
            handlers: TaskTracker::new(),
        })
    }

    /// The address the listener actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.handlers.len()
    }

    /// Runs the accept loop until [`close`](Self::close) is called or the
    /// listener fails fatally. Returns [`Error::Closed`] on deliberate
    /// shutdown; transient accept errors are retried with backoff.
    pub async fn start(&self) -> Result<()> {
        let listener = self.listener.lock().take().ok_or(Error::Closed)?;
        info!(addr = %self.local_addr, "Git daemon accepting connections");

        let mut delay = Duration::ZERO;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(Error::Closed),
                res = listener.accept() => match res {
                    Ok((stream, peer)) => {
                        delay = Duration::ZERO;
                        self.admit(stream, peer);
                    }
                    Err(_) if self.shutdown.is_cancelled() => return Err(Error::Closed),
                    Err(e) if is_transient(&e) => {
                        delay = next_delay(delay);
                        warn!(error = %e, backoff = ?delay, "Transient accept failure");
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Listener failed");
                        return Err(e.into());
                    }
                },
            }
        }
    }

    /// Hands an accepted socket to a handler task, or drops it when the
    /// connection ceiling is reached. Turned-away clients get a bare
    /// close: admission happens before the protocol starts, so there is
    /// no error frame to send.
    fn admit(&self, stream: TcpStream, peer: SocketAddr) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let Some(slot) = self.gate.try_admit() else {
            debug!(peer = %peer, "Connection ceiling reached, turning client away");
            return;
        };
        debug!(peer = %peer, "Accepted connection");
        self.handlers.spawn(handler::handle(
            stream,
            peer,
            Arc::clone(&self.cfg),
            Arc::clone(&self.backend),
            self.shutdown.clone(),
            slot,
        ));
    }

    /// Stops accepting, interrupts in-flight connections, and waits for
    /// every handler task to finish. Safe to call more than once.
    pub async fn close(&self) {
        self.shutdown.cancel();
        drop(self.listener.lock().take());
        self.handlers.close();
        self.handlers.wait().await;
        info!("Git daemon stopped");
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

/// Doubles the accept backoff from a 5ms floor to a 1s ceiling.
fn next_delay(current: Duration) -> Duration {
    if current.is_zero() {
        ACCEPT_BACKOFF_FLOOR
    } else {
        (current * 2).min(ACCEPT_BACKOFF_CEIL)
    }
}
