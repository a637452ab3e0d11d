//! # livelog
//!
//! Terminal client for instance consoles.
//!
//! ## Commands
//!
//! - `tail`: Follow a console (history first, then live lines)
//! - `buffer`: Print the console history once
//!
//! ## Example
//!
//! ```bash
//! # Follow a console
//! livelog --address core.local --token "$TOKEN" tail INSTANCE_abc
//!
//! # Dump the history from a core that serves normalized records
//! livelog --buffer-format records buffer INSTANCE_abc
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use livelog_client::BufferFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{buffer, tail};
use config::{Config, Overrides};

/// Terminal client for instance consoles.
#[derive(Parser, Debug)]
#[command(name = "livelog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: livelog.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Core host name or address
    #[arg(long, global = true)]
    address: Option<String>,

    /// Core port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// API version path segment
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Use https/wss
    #[arg(long, global = true)]
    tls: bool,

    /// Bearer token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Element format of the buffer endpoint (envelopes or records)
    #[arg(long, global = true)]
    buffer_format: Option<BufferFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow an instance console until it closes
    Tail {
        /// Instance UUID
        instance: String,
    },

    /// Print the console buffer of an instance
    Buffer {
        /// Instance UUID
        instance: String,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            address: self.address.clone(),
            port: self.port,
            api_version: self.api_version.clone(),
            tls: self.tls,
            token: self.token.clone(),
            buffer_format: self.buffer_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "livelog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).await?;
    config.apply(cli.overrides());

    match cli.command {
        Commands::Tail { instance } => tail::run(&config, &instance).await,
        Commands::Buffer { instance } => {
            buffer::run(&config, &instance).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "livelog",
            "tail",
            "INSTANCE_abc",
            "--port",
            "9000",
            "--buffer-format",
            "records",
            "--tls",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.port, Some(9000));
        assert_eq!(overrides.buffer_format, Some(BufferFormat::Records));
        assert!(overrides.tls);
        assert!(matches!(cli.command, Commands::Tail { ref instance } if instance == "INSTANCE_abc"));
    }

    #[test]
    fn rejects_unknown_buffer_format() {
        let result = Cli::try_parse_from(["livelog", "--buffer-format", "csv", "buffer", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
