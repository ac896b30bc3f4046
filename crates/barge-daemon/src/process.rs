//! Spawning and reaping of git service subprocesses.

use barge_git::Service;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// How long a drained subprocess gets to exit before it is killed.
pub(crate) const EXIT_GRACE: Duration = Duration::from_secs(2);

/// A running git service subprocess with its pipes.
///
/// Configured with `kill_on_drop`, so no exit path leaks a process even
/// when the owning task is cancelled.
#[derive(Debug)]
pub(crate) struct GitProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

/// Spawns `<git_path> <subcommand> <repo_path>` with all pipes attached.
///
/// Stderr is drained on a detached task and logged, so a chatty subprocess
/// can never wedge on a full pipe.
pub(crate) fn spawn_service(
    git_path: &str,
    service: Service,
    repo_path: &Path,
) -> io::Result<GitProcess> {
    let mut child = Command::new(git_path)
        .arg(service.subcommand())
        .arg(repo_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    if let Some(stderr) = child.stderr.take() {
        let service = service.name();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(service, "Subprocess stderr: {line}");
            }
        });
    }

    Ok(GitProcess {
        child,
        stdin,
        stdout,
    })
}

impl GitProcess {
    /// Hands out the write end of the subprocess, once.
    pub(crate) fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Hands out the read end of the subprocess, once.
    pub(crate) fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Kills the subprocess and collects it. Failures are logged only:
    /// the process may have already exited.
    pub(crate) async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!(error = %e, "Failed to kill git subprocess");
        }
    }

    /// Waits up to `grace` for a natural exit, then falls back to a kill.
    pub(crate) async fn reap(mut self, grace: Duration) {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Git subprocess finished"),
            Ok(Err(e)) => debug!(error = %e, "Failed to collect git subprocess"),
            Err(_) => {
                debug!("Git subprocess did not exit in time, killing it");
                self.kill().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn spawn_failure_surfaces_the_io_error() {
        let err = spawn_service(
            "/nonexistent/git-binary",
            Service::UploadPack,
            Path::new("/tmp/repo.git"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn spawned_process_streams_stdout_and_is_reaped() {
        // `echo` stands in for git: it prints its argv and exits.
        let mut proc = spawn_service("echo", Service::UploadPack, Path::new("/srv/demo.git"))
            .expect("echo should spawn");

        let mut stdout = proc.take_stdout().expect("stdout piped");
        assert!(proc.take_stdout().is_none());
        assert!(proc.take_stdin().is_some());

        let mut out = String::new();
        stdout.read_to_string(&mut out).await.expect("read output");
        assert_eq!(out, "upload-pack /srv/demo.git\n");

        proc.reap(Duration::from_secs(5)).await;
    }
}
