// ABOUTME: Entry point for the hoist CLI application.
// ABOUTME: Parses arguments, loads configuration once and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hoist::config::{self, Config};
use hoist::error::Result;
use hoist::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hoist=debug,russh=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let cwd = env::current_dir()?;
    let load = || match &cli.config {
        Some(path) => Config::load(path),
        None => Config::discover(&cwd),
    };

    match cli.command {
        Commands::Init {
            ref service,
            ref host,
            force,
        } => {
            config::init_config(&cwd, service.as_deref(), host.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Install => commands::install(load()?, output).await,
        Commands::Deploy { no_cache } => commands::deploy(load()?, no_cache, output).await,
        Commands::Status => commands::status(load()?, output).await,
        Commands::Logs { tail } => commands::logs(load()?, tail, output).await,
    }
}
