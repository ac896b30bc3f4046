//! Barge - an anonymous `git://` daemon.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

/// Barge - serve bare git repositories over git://
#[derive(Parser, Debug)]
#[command(name = "barge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the git daemon
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "barge.yaml")]
        config: PathBuf,

        /// Address to bind, overriding the configuration
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overriding the configuration
        #[arg(long)]
        port: Option<u16>,

        /// Repository directory, overriding the configuration
        #[arg(long)]
        repos: Option<PathBuf>,

        /// Serve repositories without an export marker
        #[arg(long)]
        export_all: bool,
    },

    /// Write a default configuration file
    InitConfig {
        /// Where to write the file
        #[arg(short, long, default_value = "barge.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            repos,
            export_all,
        } => {
            let overrides = commands::ServeOverrides {
                host,
                port,
                repos,
                export_all,
            };
            commands::serve(&config, overrides, cli.verbose).await
        }
        Commands::InitConfig { output, force } => commands::init_config(&output, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
