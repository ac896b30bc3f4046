//! The opening request of a `git://` connection.
//!
//! A daemon client starts the conversation with a single pkt-line whose
//! payload names the service and repository, e.g.
//! `git-upload-pack /project.git\0host=example.com\0`. The sections after the
//! first NUL are optional and extensible; unknown ones are ignored.

use crate::{GitError, Result, Service};

/// A parsed daemon request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonRequest {
    /// Requested service.
    pub service: Service,
    /// Repository path exactly as the client sent it.
    pub path: String,
    /// Optional `host=` attribute, surfaced for logging only.
    pub host: Option<String>,
}

impl DaemonRequest {
    /// Parses the payload of the opening pkt-line.
    ///
    /// Expected form: `<service> SP <path> NUL [host=<host> NUL] [<ext> NUL]*`.
    /// The first NUL is mandatory; git clients send it even when no host
    /// attribute follows.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| GitError::MalformedRequest("payload is not valid UTF-8".to_string()))?;

        let (head, rest) = text
            .split_once('\0')
            .ok_or_else(|| GitError::MalformedRequest("missing NUL terminator".to_string()))?;

        let (service, path) = head
            .split_once(' ')
            .ok_or_else(|| GitError::MalformedRequest("missing service or path".to_string()))?;

        if service.is_empty() {
            return Err(GitError::MalformedRequest("blank service".to_string()));
        }

        let service = Service::from_name(service)?;

        let mut host = None;
        for section in rest.split('\0') {
            if let Some(h) = section.strip_prefix("host=") {
                if host.is_none() && !h.is_empty() {
                    host = Some(h.to_string());
                }
            }
        }

        Ok(Self {
            service,
            path: path.to_string(),
            host,
        })
    }
}
