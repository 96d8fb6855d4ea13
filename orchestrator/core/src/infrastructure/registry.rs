// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Plugin and Datastore Registries
//!
//! In-memory lookups built from the client configuration. Jobs reference
//! tasks and hooks by name, resources reference datastores by name; both are
//! resolved here. Registries are built once per invocation and passed
//! explicitly to whoever needs them.

use crate::domain::client_config::{DatastoreConfig, PluginsConfig};
use crate::domain::plugin::{
    HookKind, HookPlugin, HookRepository, PluginError, PluginInfo, TaskPlugin,
    TaskPluginRepository,
};
use crate::domain::resource::{Datastore, DatastoreRepository, ResourceType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Task plugin known only by its declaration in configuration
#[derive(Debug, Clone)]
pub struct DeclaredTaskPlugin {
    info: PluginInfo,
}

impl DeclaredTaskPlugin {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            info: PluginInfo {
                name: name.into(),
                description: description.into(),
            },
        }
    }
}

impl TaskPlugin for DeclaredTaskPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }
}

/// Hook plugin known only by its declaration in configuration
#[derive(Debug, Clone)]
pub struct DeclaredHookPlugin {
    info: PluginInfo,
    kind: HookKind,
}

impl DeclaredHookPlugin {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: HookKind) -> Self {
        Self {
            info: PluginInfo {
                name: name.into(),
                description: description.into(),
            },
            kind,
        }
    }
}

impl HookPlugin for DeclaredHookPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn hook_kind(&self) -> HookKind {
        self.kind
    }
}

/// Registry of task and hook plugins
#[derive(Debug, Default)]
pub struct PluginRegistry {
    tasks: BTreeMap<String, Arc<dyn TaskPlugin>>,
    hooks: BTreeMap<String, Arc<dyn HookPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create plugin registry from the `plugins` section of the client configuration
    pub fn from_config(config: &PluginsConfig) -> Result<Self, PluginError> {
        let mut registry = Self::new();

        for task in &config.tasks {
            debug!("Registering task plugin: {}", task.name);
            registry.register_task(Arc::new(DeclaredTaskPlugin::new(
                task.name.clone(),
                task.description.clone(),
            )))?;
        }

        for hook in &config.hooks {
            debug!("Registering hook plugin: {} ({:?})", hook.name, hook.kind);
            registry.register_hook(Arc::new(DeclaredHookPlugin::new(
                hook.name.clone(),
                hook.description.clone(),
                hook.kind,
            )))?;
        }

        info!(
            "Plugin registry initialized with {} task(s) and {} hook(s)",
            registry.tasks.len(),
            registry.hooks.len()
        );
        Ok(registry)
    }

    pub fn register_task(&mut self, plugin: Arc<dyn TaskPlugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(PluginError::Duplicate(name));
        }
        self.tasks.insert(name, plugin);
        Ok(())
    }

    pub fn register_hook(&mut self, plugin: Arc<dyn HookPlugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        if self.hooks.contains_key(&name) {
            return Err(PluginError::Duplicate(name));
        }
        self.hooks.insert(name, plugin);
        Ok(())
    }
}

impl TaskPluginRepository for PluginRegistry {
    fn get_by_name(&self, name: &str) -> Result<Arc<dyn TaskPlugin>, PluginError> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::TaskNotFound(name.to_string()))
    }

    fn get_all(&self) -> Vec<Arc<dyn TaskPlugin>> {
        self.tasks.values().cloned().collect()
    }
}

impl HookRepository for PluginRegistry {
    fn get_by_name(&self, name: &str) -> Result<Arc<dyn HookPlugin>, PluginError> {
        self.hooks
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::HookNotFound(name.to_string()))
    }

    fn get_all(&self) -> Vec<Arc<dyn HookPlugin>> {
        self.hooks.values().cloned().collect()
    }
}

/// Registry of configured datastores, in configuration order
#[derive(Debug, Default, Clone)]
pub struct DatastoreRegistry {
    datastores: Vec<Arc<Datastore>>,
}

impl DatastoreRegistry {
    pub fn new(datastores: Vec<Datastore>) -> Self {
        Self {
            datastores: datastores.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(config: &[DatastoreConfig]) -> Self {
        Self::new(
            config
                .iter()
                .map(|ds| {
                    Datastore::new(
                        ds.name.clone(),
                        ds.types.iter().map(ResourceType::new).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl DatastoreRepository for DatastoreRegistry {
    fn get_by_name(&self, name: &str) -> Option<Arc<Datastore>> {
        self.datastores.iter().find(|ds| ds.name() == name).cloned()
    }

    fn get_all(&self) -> Vec<Arc<Datastore>> {
        self.datastores.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client_config::{HookPluginConfig, TaskPluginConfig};
    use std::path::PathBuf;

    fn plugins() -> PluginsConfig {
        PluginsConfig {
            tasks: vec![TaskPluginConfig {
                name: "bq2bq".to_string(),
                description: "BigQuery to BigQuery".to_string(),
            }],
            hooks: vec![HookPluginConfig {
                name: "transporter".to_string(),
                description: String::new(),
                kind: HookKind::Pre,
            }],
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = PluginRegistry::from_config(&plugins()).unwrap();

        let task = TaskPluginRepository::get_by_name(&registry, "bq2bq").unwrap();
        assert_eq!(task.info().description, "BigQuery to BigQuery");

        let hook = HookRepository::get_by_name(&registry, "transporter").unwrap();
        assert_eq!(hook.hook_kind(), HookKind::Pre);

        assert_eq!(
            TaskPluginRepository::get_by_name(&registry, "missing").unwrap_err(),
            PluginError::TaskNotFound("missing".to_string())
        );
        assert_eq!(
            HookRepository::get_by_name(&registry, "missing").unwrap_err(),
            PluginError::HookNotFound("missing".to_string())
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = PluginRegistry::new();
        registry
            .register_task(Arc::new(DeclaredTaskPlugin::new("bq2bq", "")))
            .unwrap();
        let err = registry
            .register_task(Arc::new(DeclaredTaskPlugin::new("bq2bq", "")))
            .unwrap_err();
        assert_eq!(err, PluginError::Duplicate("bq2bq".to_string()));
    }

    #[test]
    fn test_datastores_keep_config_order() {
        let registry = DatastoreRegistry::from_config(&[
            DatastoreConfig {
                name: "bigquery".to_string(),
                path: PathBuf::from("bq"),
                types: vec!["table".to_string(), "view".to_string()],
            },
            DatastoreConfig {
                name: "postgres".to_string(),
                path: PathBuf::from("pg"),
                types: vec!["table".to_string()],
            },
        ]);

        let names: Vec<_> = registry.get_all().iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["bigquery", "postgres"]);

        let bq = registry.get_by_name("bigquery").unwrap();
        assert!(bq.supports(&ResourceType::new("view")));
        assert!(registry.get_by_name("mysql").is_none());
    }
}
