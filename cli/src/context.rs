// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Project context shared by the commands
//!
//! Loads the client configuration and wires the plugin and datastore
//! registries, the job adapter and the local spec repositories from it.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use tributary_core::application::deploy::ResourceSource;
use tributary_core::domain::client_config::ClientConfig;
use tributary_core::domain::repository::ResourceSpecRepository;
use tributary_core::domain::resource::{Datastore, DatastoreRepository};
use tributary_core::infrastructure::spec_validation::SpecValidator;
use tributary_core::infrastructure::{
    DatastoreRegistry, JobSpecAdapter, LocalJobSpecRepository, LocalResourceSpecRepository,
    PluginRegistry,
};

pub struct ProjectContext {
    pub config: ClientConfig,
    pub plugins: Arc<PluginRegistry>,
    pub datastores: Arc<DatastoreRegistry>,
    adapter: JobSpecAdapter,
}

impl ProjectContext {
    /// Discover and load configuration; `host` wins over file and environment
    pub fn load(config_path: Option<PathBuf>, host: Option<String>) -> Result<Self> {
        let mut config =
            ClientConfig::load_or_default(config_path).context("Failed to load configuration")?;
        if let Some(host) = host {
            config.host = host;
        }
        Self::from_config(config)
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let plugins = Arc::new(
            PluginRegistry::from_config(&config.plugins).context("Invalid plugin declarations")?,
        );
        let datastores = Arc::new(DatastoreRegistry::from_config(&config.datastores));
        let adapter = JobSpecAdapter::new(
            plugins.clone(),
            plugins.clone(),
            Arc::new(SpecValidator::default()),
        );

        Ok(Self {
            config,
            plugins,
            datastores,
            adapter,
        })
    }

    pub fn adapter(&self) -> &JobSpecAdapter {
        &self.adapter
    }

    pub fn job_repository(&self) -> LocalJobSpecRepository {
        LocalJobSpecRepository::new(self.config.jobs.path.clone(), self.adapter.clone())
    }

    /// Resource repository rooted at a configured datastore's spec path
    pub fn resource_repository(
        &self,
        datastore: &str,
    ) -> Result<(Arc<Datastore>, LocalResourceSpecRepository)> {
        let config = self
            .config
            .datastores
            .iter()
            .find(|ds| ds.name == datastore)
            .ok_or_else(|| {
                anyhow!(
                    "unregistered datastore '{}', declare it under datastores in the configuration",
                    datastore
                )
            })?;
        let datastore = self
            .datastores
            .get_by_name(datastore)
            .ok_or_else(|| anyhow!("unsupported datastore '{}'", datastore))?;
        let repository = LocalResourceSpecRepository::new(config.path.clone(), datastore.clone());
        Ok((datastore, repository))
    }

    /// One batch per configured datastore, in configuration order
    pub fn resource_sources(&self) -> Vec<ResourceSource> {
        self.config
            .datastores
            .iter()
            .map(|ds| {
                let root = ds.path.clone();
                ResourceSource::new(ds.name.clone(), move |datastore| {
                    Arc::new(LocalResourceSpecRepository::new(root.clone(), datastore))
                        as Arc<dyn ResourceSpecRepository>
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tributary_core::domain::plugin::{HookRepository, TaskPluginRepository};
    use tributary_core::domain::resource::DatastoreRepository;

    #[test]
    fn test_context_from_config() {
        let config = ClientConfig::from_yaml_str(
            r#"
project:
  name: data-platform
datastores:
  - name: bigquery
    path: ./datastore/bigquery
    types: [dataset, table]
plugins:
  tasks:
    - name: bq2bq
  hooks:
    - name: transporter
      kind: post
"#,
        )
        .unwrap();

        let ctx = ProjectContext::from_config(config).unwrap();
        assert!(TaskPluginRepository::get_by_name(ctx.plugins.as_ref(), "bq2bq").is_ok());
        assert!(HookRepository::get_by_name(ctx.plugins.as_ref(), "transporter").is_ok());
        assert!(ctx.datastores.get_by_name("bigquery").is_some());

        let sources = ctx.resource_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].datastore(), "bigquery");

        let (datastore, repository) = ctx.resource_repository("bigquery").unwrap();
        assert_eq!(datastore.name(), "bigquery");
        assert_eq!(repository.root(), std::path::Path::new("./datastore/bigquery"));
        assert!(ctx.resource_repository("postgres").is_err());
    }

    #[test]
    fn test_duplicate_plugins_rejected() {
        let config = ClientConfig::from_yaml_str(
            "plugins:\n  tasks:\n    - name: bq2bq\n    - name: bq2bq\n",
        )
        .unwrap();
        assert!(ProjectContext::from_config(config).is_err());
    }
}
