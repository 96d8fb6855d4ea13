// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! # Tributary CLI
//!
//! The `tributary` binary authors job specifications on disk and deploys a
//! project's jobs and resources to the orchestrator.
//!
//! ## Commands
//!
//! - `tributary deploy` - Push resources and jobs to the orchestrator
//! - `tributary create job|hook|resource` - Author job and resource specifications
//! - `tributary config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use tributary_cli::commands::{self, ConfigCommand, CreateCommand, DeployArgs};
use tributary_cli::context::ProjectContext;
use tributary_core::domain::client_config::CONFIG_PATH_ENV;

/// Tributary - author and deploy scheduled data jobs
#[derive(Parser)]
#[command(name = "tributary")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = CONFIG_PATH_ENV,
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Orchestrator address, overrides configuration and TRIBUTARY_HOST
    #[arg(long, global = true, value_name = "HOST:PORT")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "TRIBUTARY_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the project's resources and jobs
    Deploy(DeployArgs),

    /// Author job and resource specifications
    Create {
        #[command(subcommand)]
        command: CreateCommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    if let Err(err) = run(command, cli.config, cli.host).await {
        for cause in err.chain() {
            eprintln!("{}", cause.to_string().red());
        }
        eprintln!("{}", "unable to complete request successfully".red().bold());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, config: Option<PathBuf>, host: Option<String>) -> Result<()> {
    match command {
        Commands::Deploy(args) => {
            commands::deploy::execute(args, ProjectContext::load(config, host)?).await
        }
        Commands::Create { command } => {
            commands::create::handle_command(command, ProjectContext::load(config, host)?).await
        }
        Commands::Config { command } => commands::config::handle_command(command, config, host).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
