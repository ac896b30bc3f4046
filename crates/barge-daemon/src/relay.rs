//! Byte relay between a client socket and a git subprocess.
//!
//! The relay runs two copy pumps (client to subprocess stdin, subprocess
//! stdout to client) under a single select that also watches the shutdown
//! token, the absolute deadline, and the idle timer. Activity tracking
//! lives in [`TrackedStream`], so any byte moved in either direction rearms
//! the idle window while the absolute deadline is never extended.

use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tracks when a connection last moved application bytes.
#[derive(Debug)]
pub(crate) struct ActivityTimer {
    last: Mutex<Instant>,
}

impl ActivityTimer {
    pub(crate) fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Marks activity now.
    pub(crate) fn touch(&self) {
        *self.last.lock() = Instant::now();
    }

    /// Resolves once `window` has elapsed with no activity. Re-checks after
    /// every wakeup, so a touch during the sleep pushes the deadline out.
    pub(crate) async fn idle_elapsed(&self, window: Duration) {
        loop {
            let deadline = *self.last.lock() + window;
            if Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
pub(crate) async fn maybe_sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Waits out the idle window, or forever when the timer is disabled.
pub(crate) async fn maybe_idle(activity: &ActivityTimer, window: Option<Duration>) {
    match window {
        Some(window) => activity.idle_elapsed(window).await,
        None => std::future::pending().await,
    }
}

/// Stream wrapper that reports io activity.
///
/// Every read or write that moves at least one byte touches the activity
/// timer. The first write also flips `wrote`, marking that negotiation
/// output reached the client and error frames are no longer meaningful.
pub(crate) struct TrackedStream<S> {
    inner: S,
    activity: Arc<ActivityTimer>,
    wrote: Arc<AtomicBool>,
}

impl<S> TrackedStream<S> {
    pub(crate) fn new(inner: S, activity: Arc<ActivityTimer>, wrote: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            activity,
            wrote,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TrackedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let res = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &res {
            if buf.filled().len() > before {
                this.activity.touch();
            }
        }
        res
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TrackedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let res = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &res {
            if *n > 0 {
                this.activity.touch();
                this.wrote.store(true, Ordering::Relaxed);
            }
        }
        res
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Why a relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelayEnd {
    /// Daemon-wide shutdown.
    Shutdown,
    /// The connection outlived its absolute ceiling.
    AbsoluteTimeout,
    /// No bytes moved within the idle window.
    IdleTimeout,
    /// The subprocess finished and its output was fully flushed.
    Drained,
    /// The client went away mid-conversation.
    ClientClosed,
}

async fn pump<R, W>(mut from: R, mut to: W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tokio::io::copy(&mut from, &mut to).await
}

/// Relays bytes both ways until a termination condition wins.
///
/// `proc_in` is taken by value: when the client half-closes, the inbound
/// pump finishes and drops it, which the subprocess observes as end of
/// input. The client write half stays borrowed so the caller can still
/// frame a timeout error after the relay ends.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn relay<CR, CW, PO, PI>(
    client_rd: &mut CR,
    client_wr: &mut CW,
    proc_out: PO,
    proc_in: PI,
    activity: &ActivityTimer,
    idle: Option<Duration>,
    absolute: Option<Instant>,
    shutdown: &CancellationToken,
) -> RelayEnd
where
    CR: AsyncRead + Unpin,
    CW: AsyncWrite + Unpin,
    PO: AsyncRead + Unpin,
    PI: AsyncWrite + Unpin,
{
    tokio::pin! {
        let inbound = pump(&mut *client_rd, proc_in);
        let outbound = pump(proc_out, &mut *client_wr);
    }

    let mut client_done = false;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return RelayEnd::Shutdown,
            _ = maybe_sleep_until(absolute) => return RelayEnd::AbsoluteTimeout,
            _ = maybe_idle(activity, idle) => return RelayEnd::IdleTimeout,
            res = &mut outbound => {
                return match res {
                    Ok(_) => RelayEnd::Drained,
                    Err(_) => RelayEnd::ClientClosed,
                };
            }
            res = &mut inbound, if !client_done => {
                // Client half-closed (or its read side failed). The inbound
                // pump just dropped the subprocess stdin; keep draining
                // subprocess output until it finishes or a timer fires.
                client_done = true;
                if let Err(e) = res {
                    debug!(error = %e, "Inbound relay ended early");
                }
            }
        }
    }
}
