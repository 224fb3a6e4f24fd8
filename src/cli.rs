// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Provision and redeploy a compose service on a remote host")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (default: discover hoist.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a hoist.yml configuration file
    Init {
        /// Compose service name
        #[arg(long)]
        service: Option<String>,

        /// Host as [user@]host[:port]
        #[arg(long)]
        host: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Detect compose on the host and install it if missing
    Install,

    /// Stop, rebuild, start and verify the service
    Deploy {
        /// Rebuild the image without the layer cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Check whether the service is running
    Status,

    /// Show recent service log lines
    Logs {
        /// Number of lines
        #[arg(short = 'n', long, default_value_t = 100)]
        tail: u32,
    },
}
