//! Per-connection protocol flow.
//!
//! One task per accepted socket: read the request frame, check access,
//! spawn the matching git subprocess, relay until a side finishes or a
//! timer fires. Error frames only go out before any negotiation bytes
//! have been written; after that the connection is torn down bare.

use crate::admission::Slot;
use crate::config::DaemonConfig;
use crate::process::{spawn_service, EXIT_GRACE};
use crate::relay::{maybe_idle, maybe_sleep_until, relay, ActivityTimer, RelayEnd, TrackedStream};
use barge_backend::{AccessLevel, Backend, Repository};
use barge_git::{DaemonRequest, GitError, Packet, PktLineReader, PktLineWriter, WireError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of reading the opening request frame.
enum Opening {
    Payload(Vec<u8>),
    Fail(WireError),
    Silent,
}

/// Drives one client connection from accept to close.
///
/// The admission slot rides along for the task's whole lifetime and is
/// released on drop, whichever way the connection ends.
pub(crate) async fn handle(
    stream: TcpStream,
    peer: SocketAddr,
    cfg: Arc<DaemonConfig>,
    backend: Arc<dyn Backend>,
    shutdown: CancellationToken,
    _slot: Slot,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(peer = %peer, error = %e, "Failed to disable Nagle");
    }

    let activity = Arc::new(ActivityTimer::new());
    let wrote = Arc::new(AtomicBool::new(false));
    let mut stream = TrackedStream::new(stream, activity.clone(), wrote.clone());

    let idle = cfg.idle_duration();
    // Armed once per connection; request parsing counts against it too.
    let absolute = cfg.max_duration().map(|d| Instant::now() + d);

    let opening = {
        let mut reader = PktLineReader::new(&mut stream);
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Opening::Silent,
            _ = maybe_sleep_until(absolute) => Opening::Fail(WireError::Timeout),
            _ = maybe_idle(&activity, idle) => Opening::Fail(WireError::Timeout),
            res = reader.read() => match res {
                Ok(Some(Packet::Data(payload))) => Opening::Payload(payload),
                Ok(Some(_)) => Opening::Fail(WireError::InvalidRequest),
                Ok(None) => Opening::Silent,
                Err(GitError::Io(e)) => {
                    debug!(peer = %peer, error = %e, "Request read failed");
                    Opening::Silent
                }
                Err(e) => {
                    debug!(peer = %peer, error = %e, "Unreadable request frame");
                    Opening::Fail(WireError::InvalidRequest)
                }
            },
        }
    };

    let payload = match opening {
        Opening::Payload(payload) => payload,
        Opening::Fail(err) => {
            send_error(&mut stream, &wrote, err).await;
            return;
        }
        Opening::Silent => return,
    };

    let request = match DaemonRequest::parse(&payload) {
        Ok(request) => request,
        Err(e) => {
            debug!(peer = %peer, error = %e, "Rejecting malformed request");
            let err = match e {
                GitError::UnknownService(_) => WireError::InvalidRepo,
                _ => WireError::InvalidRequest,
            };
            send_error(&mut stream, &wrote, err).await;
            return;
        }
    };
    debug!(
        peer = %peer,
        service = %request.service,
        path = %request.path,
        host = request.host.as_deref().unwrap_or("-"),
        "Parsed daemon request"
    );

    let repo = match authorize(&cfg, backend.as_ref(), &request).await {
        Ok(repo) => repo,
        Err(reason) => {
            debug!(peer = %peer, path = %request.path, reason, "Refusing request");
            send_error(&mut stream, &wrote, WireError::InvalidRepo).await;
            return;
        }
    };
    info!(peer = %peer, service = %request.service, repo = %repo.name(), "Serving git request");

    let mut proc = match spawn_service(&cfg.git_path, request.service, repo.path()) {
        Ok(proc) => proc,
        Err(e) => {
            warn!(peer = %peer, repo = %repo.name(), error = %e, "Failed to spawn git subprocess");
            return;
        }
    };
    let (Some(proc_in), Some(proc_out)) = (proc.take_stdin(), proc.take_stdout()) else {
        proc.kill().await;
        return;
    };

    let (mut client_rd, mut client_wr) = tokio::io::split(stream);
    let end = relay(
        &mut client_rd,
        &mut client_wr,
        proc_out,
        proc_in,
        &activity,
        idle,
        absolute,
        &shutdown,
    )
    .await;

    match end {
        RelayEnd::Shutdown | RelayEnd::ClientClosed => proc.kill().await,
        RelayEnd::AbsoluteTimeout | RelayEnd::IdleTimeout => {
            proc.kill().await;
            send_error(&mut client_wr, &wrote, WireError::Timeout).await;
        }
        RelayEnd::Drained => proc.reap(EXIT_GRACE).await,
    }
    debug!(peer = %peer, outcome = ?end, "Connection finished");
}

/// Maps a parsed request to a servable repository, or a refusal reason.
///
/// All refusals collapse to the same wire answer. The distinct reasons
/// exist for the logs only, so probing clients cannot tell a private
/// repository from a missing one.
async fn authorize(
    cfg: &DaemonConfig,
    backend: &dyn Backend,
    request: &DaemonRequest,
) -> Result<Repository, &'static str> {
    if !cfg.anon_access.has(AccessLevel::ReadOnly) {
        return Err("anonymous access disabled");
    }
    if !request.service.is_read_only() {
        return Err("service not allowed");
    }
    let repo = backend
        .repository(&request.path)
        .await
        .map_err(|_| "repository not found")?;
    if !backend.access_level(&repo).await.has(AccessLevel::ReadOnly) {
        return Err("access below read-only");
    }
    Ok(repo)
}

/// Frames `err` for the client unless negotiation output already went out.
async fn send_error<W>(wr: &mut W, wrote: &AtomicBool, err: WireError)
where
    W: AsyncWrite + Unpin,
{
    if wrote.load(Ordering::Relaxed) {
        return;
    }
    let mut writer = PktLineWriter::new(wr);
    if let Err(e) = writer.write_error(&err.to_string()).await {
        debug!(error = %e, "Failed to send error frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_frames_stop_once_negotiation_output_exists() {
        let mut out = Vec::new();
        let wrote = AtomicBool::new(false);
        send_error(&mut out, &wrote, WireError::InvalidRepo).await;
        assert_eq!(out, b"0010invalid repo0000");

        // After the subprocess has written to the client there is no
        // channel left for an out-of-band error; the close stays bare.
        out.clear();
        wrote.store(true, Ordering::Relaxed);
        send_error(&mut out, &wrote, WireError::Timeout).await;
        assert!(out.is_empty());
    }
}
