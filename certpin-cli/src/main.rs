//! certpin - fetch and check TLS servers against pinned certificates

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod utils;

use config::PinConfig;

/// certpin - Certificate pinning for TLS connections
#[derive(Parser)]
#[command(name = "certpin", version, about)]
struct Cli {
    /// Pin configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL, trusting only pinned certificates
    Fetch {
        /// HTTPS URL to fetch
        url: String,

        /// Pinned certificate (DER); overrides the config for this host
        #[arg(long = "cert", value_name = "PATH")]
        certs: Vec<PathBuf>,
    },

    /// Decide offline whether a certificate chain would be trusted
    Check {
        /// Server name the chain is presented for
        #[arg(long)]
        host: String,

        /// Presented certificate (DER), leaf first; repeat for intermediates
        #[arg(long = "chain", value_name = "PATH", required = true)]
        chain: Vec<PathBuf>,

        /// Pinned certificate (DER); overrides the config for this host
        #[arg(long = "cert", value_name = "PATH")]
        certs: Vec<PathBuf>,
    },

    /// Show subject, validity and fingerprint of a certificate
    Inspect {
        /// Certificate file (DER)
        path: PathBuf,
    },

    /// List configured pins
    Pins,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = &result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = PinConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Fetch { url, certs } => commands::run_fetch(url, certs, &config).await,
        Commands::Check { host, chain, certs } => {
            commands::run_check(host, chain, certs, &config, cli.json).await
        }
        Commands::Inspect { path } => commands::run_inspect(path, cli.json),
        Commands::Pins => commands::run_pins(&config, cli.json),
    }
}
