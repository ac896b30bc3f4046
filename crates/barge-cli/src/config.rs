//! Server process configuration.
//!
//! Settings come from a YAML file with `BARGE__`-prefixed environment
//! variables layered on top, e.g. `BARGE__GIT__PORT=9419` overrides the
//! `git.port` key. Missing keys fall back to defaults, so an empty or
//! absent file is a valid configuration.

use barge_daemon::DaemonConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level configuration for the barge server process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the bare repositories, created if missing.
    pub repos_path: PathBuf,
    /// Serve repositories without an export marker too.
    pub export_all: bool,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// The `git://` listener.
    pub git: DaemonConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos_path: PathBuf::from("repos"),
            export_all: false,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            git: DaemonConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, then the environment.
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("BARGE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.repos_path, PathBuf::from("repos"));
        assert!(!cfg.export_all);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert_eq!(cfg.git.port, 9418);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(cfg.git.port, 9418);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("barge.yaml");
        fs::write(
            &path,
            "repos_path: /srv/git\nlog_format: json\ngit:\n  port: 9419\n  idle_timeout: 5\n",
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.repos_path, PathBuf::from("/srv/git"));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.git.port, 9419);
        assert_eq!(cfg.git.idle_timeout, 5);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.git.max_connections, 32);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_default_config_roundtrips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.git.port, Config::default().git.port);
        assert_eq!(parsed.repos_path, Config::default().repos_path);
    }
}
