//! CLI command implementations.

use crate::config::{Config, LogFormat};
use barge_backend::FsBackend;
use barge_daemon::Daemon;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0} already exists (use --force to overwrite)")]
    ConfigExists(String),

    #[error("failed to render configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Daemon(#[from] barge_daemon::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub repos: Option<PathBuf>,
    pub export_all: bool,
}

/// Run the git daemon until interrupted.
pub async fn serve(config_path: &Path, overrides: ServeOverrides, verbose: u8) -> Result<()> {
    let mut cfg = Config::load(config_path)?;
    if let Some(host) = overrides.host {
        cfg.git.host = host;
    }
    if let Some(port) = overrides.port {
        cfg.git.port = port;
    }
    if let Some(repos) = overrides.repos {
        cfg.repos_path = repos;
    }
    if overrides.export_all {
        cfg.export_all = true;
    }

    init_tracing(&cfg, verbose);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting barge");
    tracing::info!(
        repos = %cfg.repos_path.display(),
        addr = %cfg.git.bind_addr(),
        export_all = cfg.export_all,
        "Server configuration"
    );

    std::fs::create_dir_all(&cfg.repos_path)?;
    let mut backend = FsBackend::new(&cfg.repos_path, cfg.git.anon_access);
    if cfg.export_all {
        backend = backend.export_all();
    }

    let daemon = Daemon::bind(cfg.git.clone(), Arc::new(backend)).await?;
    tokio::select! {
        res = daemon.start() => res?,
        sig = tokio::signal::ctrl_c() => {
            sig?;
            tracing::info!("Interrupt received, shutting down");
            daemon.close().await;
        }
    }
    Ok(())
}

/// Write a default configuration file.
pub fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(CliError::ConfigExists(output.display().to_string()));
    }

    let yaml = serde_yaml::to_string(&Config::default())?;
    std::fs::write(output, yaml)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

fn init_tracing(cfg: &Config, verbose: u8) {
    let level = match verbose {
        0 => cfg.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("barge_cli={level},barge_daemon={level},barge_backend={level},barge_git={level}")
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match cfg.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
