//! Daemon configuration snapshot.

use barge_backend::AccessLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable configuration for one daemon instance.
///
/// Zero disables a limit: a zero timeout never fires and a zero
/// `max_connections` means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address to bind.
    pub host: String,
    /// TCP port to bind. `0` picks an ephemeral port.
    pub port: u16,
    /// Seconds of inactivity before a connection is closed.
    pub idle_timeout: u64,
    /// Ceiling in seconds on a connection's total lifetime, idle or not.
    pub max_timeout: u64,
    /// Cap on concurrently served connections.
    pub max_connections: usize,
    /// Access level granted to anonymous clients. Below read-only the
    /// daemon answers every request with an error.
    pub anon_access: AccessLevel,
    /// The `git` binary used to serve requests.
    pub git_path: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9418,
            idle_timeout: 120,
            max_timeout: 0,
            max_connections: 32,
            anon_access: AccessLevel::ReadOnly,
            git_path: "git".to_string(),
        }
    }
}

impl DaemonConfig {
    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Idle window, or `None` when disabled.
    pub fn idle_duration(&self) -> Option<Duration> {
        (self.idle_timeout > 0).then(|| Duration::from_secs(self.idle_timeout))
    }

    /// Lifetime ceiling, or `None` when disabled.
    pub fn max_duration(&self) -> Option<Duration> {
        (self.max_timeout > 0).then(|| Duration::from_secs(self.max_timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DaemonConfig::default();
        assert_eq!(cfg.port, 9418);
        assert_eq!(cfg.idle_timeout, 120);
        assert_eq!(cfg.max_timeout, 0);
        assert_eq!(cfg.max_connections, 32);
        assert_eq!(cfg.anon_access, AccessLevel::ReadOnly);
        assert_eq!(cfg.git_path, "git");
    }

    #[test]
    fn test_zero_disables_timers() {
        let cfg = DaemonConfig {
            idle_timeout: 0,
            max_timeout: 0,
            ..DaemonConfig::default()
        };
        assert_eq!(cfg.idle_duration(), None);
        assert_eq!(cfg.max_duration(), None);

        let cfg = DaemonConfig {
            idle_timeout: 3,
            max_timeout: 100,
            ..DaemonConfig::default()
        };
        assert_eq!(cfg.idle_duration(), Some(Duration::from_secs(3)));
        assert_eq!(cfg.max_duration(), Some(Duration::from_secs(100)));
    }

    #[test]
    fn test_bind_addr() {
        let cfg = DaemonConfig {
            host: "127.0.0.1".to_string(),
            port: 9418,
            ..DaemonConfig::default()
        };
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9418");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg: DaemonConfig = serde_yaml::from_str("port: 9419\nidle_timeout: 5\n").unwrap();
        assert_eq!(cfg.port, 9419);
        assert_eq!(cfg.idle_timeout, 5);
        assert_eq!(cfg.max_connections, 32);
        assert_eq!(cfg.anon_access, AccessLevel::ReadOnly);
    }
}
