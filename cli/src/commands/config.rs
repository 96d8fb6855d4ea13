// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use tributary_core::domain::client_config::{ClientConfig, CONFIG_FILE_NAME, CONFIG_PATH_ENV};

use crate::context::ProjectContext;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with default values
    Generate {
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
    host: Option<String>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, host, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override), host),
        ConfigCommand::Generate { output, force } => generate(output, force),
    }
}

fn show(config_override: Option<PathBuf>, host: Option<String>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./{}", CONFIG_FILE_NAME);
        println!("  4. ~/.tributary/config.yaml");
        println!();
    }

    let mut config =
        ClientConfig::load_or_default(config_override).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.host = host;
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Host: {}", config.host);
    println!(
        "  Project: {}",
        if config.project.name.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            config.project.name.clone()
        }
    );
    println!("  Jobs: {}", config.jobs.path.display());
    println!(
        "  Timeouts: dial {:?}, deploy {:?}",
        config.timeouts.dial, config.timeouts.deploy
    );
    println!();

    println!("{}", "Datastores:".bold());
    for datastore in &config.datastores {
        println!(
            "  {} ({}) → {}",
            datastore.name.bold(),
            datastore.types.join(", "),
            datastore.path.display()
        );
    }
    println!();

    println!("{}", "Plugins:".bold());
    for task in &config.plugins.tasks {
        println!("  task {}", task.name);
    }
    for hook in &config.plugins.hooks {
        println!("  hook {} ({:?})", hook.name, hook.kind);
    }

    Ok(())
}

fn validate(config_path: Option<PathBuf>, host: Option<String>) -> Result<()> {
    println!("Validating configuration...");
    ProjectContext::load(config_path, host)?;
    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", output.display());
    }

    let yaml = serde_yaml::to_string(&ClientConfig::default())
        .context("Failed to serialize default configuration")?;
    std::fs::write(&output, yaml)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join(CONFIG_FILE_NAME);

        generate(output.clone(), false).unwrap();
        let config = ClientConfig::from_yaml_file(&output).unwrap();
        assert_eq!(config.host, ClientConfig::default().host);
        assert!(config.validate().is_ok());

        assert!(generate(output.clone(), false).is_err());
        assert!(generate(output, true).is_ok());
    }
}
