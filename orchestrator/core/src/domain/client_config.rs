// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

// Client Configuration Types
//
// Defines the configuration schema for the Tributary client, including:
// - Orchestrator endpoint and connection/deployment timeouts
// - Project identity and global project configuration
// - Job spec location and datastore spec locations
// - Task and hook plugins known to this client

use crate::domain::deployment::{DEFAULT_DEPLOY_TIMEOUT, DEFAULT_DIAL_TIMEOUT};
use crate::domain::plugin::HookKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tributary.yaml";

/// Environment variable pointing at a configuration file
pub const CONFIG_PATH_ENV: &str = "TRIBUTARY_CONFIG_PATH";

/// Environment variable overriding the orchestrator host
pub const HOST_ENV: &str = "TRIBUTARY_HOST";

/// Top-level client configuration (`tributary.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Orchestrator gRPC endpoint (`host:port` or URL)
    #[serde(default = "default_host")]
    pub host: String,

    /// Project identity and global configuration
    #[serde(default)]
    pub project: ProjectConfig,

    /// Where job specifications live
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Datastores and the directories holding their resource specs
    #[serde(default)]
    pub datastores: Vec<DatastoreConfig>,

    /// Plugins available to job specifications
    #[serde(default)]
    pub plugins: PluginsConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Default project name when `--project` is not given
    #[serde(default)]
    pub name: String,

    /// Global configuration sent when registering the project
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_jobs_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    pub name: String,

    /// Root directory of this datastore's resource specs
    pub path: PathBuf,

    /// Resource types the datastore accepts
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub tasks: Vec<TaskPluginConfig>,

    #[serde(default)]
    pub hooks: Vec<HookPluginConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPluginConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookPluginConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: HookKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Bound on establishing the connection (e.g. "5s")
    #[serde(default = "default_dial_timeout", with = "humantime_serde")]
    pub dial: Duration,

    /// Bound on the whole deployment (e.g. "5m")
    #[serde(default = "default_deploy_timeout", with = "humantime_serde")]
    pub deploy: Duration,
}

// Default value functions
fn default_host() -> String {
    "localhost:9100".to_string()
}

fn default_jobs_path() -> PathBuf {
    PathBuf::from("./jobs")
}

fn default_dial_timeout() -> Duration {
    DEFAULT_DIAL_TIMEOUT
}

fn default_deploy_timeout() -> Duration {
    DEFAULT_DEPLOY_TIMEOUT
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            path: default_jobs_path(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            dial: DEFAULT_DIAL_TIMEOUT,
            deploy: DEFAULT_DEPLOY_TIMEOUT,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            project: ProjectConfig::default(),
            jobs: JobsConfig::default(),
            datastores: vec![],
            plugins: PluginsConfig::default(),
            timeouts: TimeoutsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. TRIBUTARY_CONFIG_PATH environment variable
    /// 2. ./tributary.yaml (working directory)
    /// 3. ~/.tributary/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from(CONFIG_FILE_NAME);
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tributary").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var(HOST_ENV) {
            if host.trim().is_empty() {
                tracing::warn!("Ignoring empty {} override", HOST_ENV);
            } else {
                tracing::info!("Environment override: {}={}", HOST_ENV, host);
                self.host = host;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host cannot be empty");
        }

        if self.timeouts.dial.is_zero() {
            anyhow::bail!("timeouts.dial must be greater than zero");
        }
        if self.timeouts.deploy.is_zero() {
            anyhow::bail!("timeouts.deploy must be greater than zero");
        }

        let mut seen = HashSet::new();
        for datastore in &self.datastores {
            if datastore.name.is_empty() {
                anyhow::bail!("datastore name cannot be empty");
            }
            if !seen.insert(datastore.name.as_str()) {
                anyhow::bail!("datastore '{}' is configured twice", datastore.name);
            }
            if datastore.types.is_empty() {
                anyhow::bail!("datastore '{}' must declare at least one resource type", datastore.name);
            }
        }

        let mut seen = HashSet::new();
        for task in &self.plugins.tasks {
            if task.name.is_empty() {
                anyhow::bail!("task plugin name cannot be empty");
            }
            if !seen.insert(task.name.as_str()) {
                anyhow::bail!("task plugin '{}' is declared twice", task.name);
            }
        }

        let mut seen = HashSet::new();
        for hook in &self.plugins.hooks {
            if hook.name.is_empty() {
                anyhow::bail!("hook plugin name cannot be empty");
            }
            if !seen.insert(hook.name.as_str()) {
                anyhow::bail!("hook plugin '{}' is declared twice", hook.name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost:9100");
        assert_eq!(config.timeouts.dial, Duration::from_secs(5));
        assert_eq!(config.timeouts.deploy, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
host: orchestrator.internal:9100
project:
  name: data-platform
  config:
    environment: production
    storage_path: gs://bucket
jobs:
  path: ./specs/jobs
datastores:
  - name: bigquery
    path: ./specs/bigquery
    types: [dataset, table, view]
plugins:
  tasks:
    - name: bq2bq
      description: BigQuery to BigQuery transformation
  hooks:
    - name: transporter
      kind: post
timeouts:
  dial: 2s
  deploy: 10m
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.project.name, "data-platform");
        assert_eq!(config.project.config.get("environment").map(String::as_str), Some("production"));
        assert_eq!(config.datastores[0].types.len(), 3);
        assert_eq!(config.plugins.hooks[0].kind, HookKind::Post);
        assert_eq!(config.timeouts.dial, Duration::from_secs(2));
        assert_eq!(config.timeouts.deploy, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::default();

        config.host = " ".to_string();
        assert!(config.validate().is_err());
        config.host = "localhost:9100".to_string();

        config.timeouts.dial = Duration::ZERO;
        assert!(config.validate().is_err());
        config.timeouts.dial = Duration::from_secs(5);

        let datastore = DatastoreConfig {
            name: "bigquery".to_string(),
            path: PathBuf::from("./bq"),
            types: vec!["table".to_string()],
        };
        config.datastores = vec![datastore.clone(), datastore];
        assert!(config.validate().is_err());
        config.datastores.pop();
        assert!(config.validate().is_ok());

        config.plugins.tasks = vec![
            TaskPluginConfig { name: "bq2bq".to_string(), description: String::new() },
            TaskPluginConfig { name: "bq2bq".to_string(), description: String::new() },
        ];
        assert!(config.validate().is_err());
    }
}
