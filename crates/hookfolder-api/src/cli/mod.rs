//! CLI command definitions for the `hookfolder` binary.

pub mod check;
pub mod sign;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hookfolder_types::webhook::SignatureAlgorithm;

/// Turn GitHub issue webhooks into Google Drive folders.
#[derive(Parser)]
#[command(name = "hookfolder", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, env = "HOOKFOLDER_CONFIG", default_value = "hookfolder.toml")]
    pub config: PathBuf,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directives for the chosen verbosity.
    pub fn log_directives(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info,tower_http=warn",
            1 => "info,hookfolder=debug,tower_http=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file).
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the signature header GitHub would send for a request body.
    Sign {
        /// File holding the exact body bytes.
        file: PathBuf,

        /// Signature algorithm (defaults to the configured one).
        #[arg(long)]
        algorithm: Option<SignatureAlgorithm>,
    },

    /// Validate the configuration and print a summary.
    CheckConfig,
}
