// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Task and Hook Plugins
//!
//! Jobs name their transformation task and hooks by identifier. Those
//! identifiers are resolved against registries at adaptation time; the
//! internal schema of a plugin (questions, default config, assets) is owned
//! by the plugin itself and is opaque here.
//!
//! An unresolved name is always an error, never a default.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Descriptive information every plugin exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// When a hook runs relative to the job's task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    Pre,
    Post,
}

impl Default for HookKind {
    fn default() -> Self {
        Self::Post
    }
}

/// A transformation unit a job executes
pub trait TaskPlugin: Debug + Send + Sync {
    fn info(&self) -> &PluginInfo;

    fn name(&self) -> &str {
        &self.info().name
    }
}

/// A unit of work attached before or after a job's task
pub trait HookPlugin: Debug + Send + Sync {
    fn info(&self) -> &PluginInfo;

    fn hook_kind(&self) -> HookKind;

    fn name(&self) -> &str {
        &self.info().name
    }
}

/// Lookup of task plugins by name
pub trait TaskPluginRepository: Send + Sync {
    fn get_by_name(&self, name: &str) -> Result<Arc<dyn TaskPlugin>, PluginError>;

    fn get_all(&self) -> Vec<Arc<dyn TaskPlugin>>;
}

/// Lookup of hook plugins by name
pub trait HookRepository: Send + Sync {
    fn get_by_name(&self, name: &str) -> Result<Arc<dyn HookPlugin>, PluginError>;

    fn get_all(&self) -> Vec<Arc<dyn HookPlugin>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("task plugin not found: {0}")]
    TaskNotFound(String),

    #[error("hook plugin not found: {0}")]
    HookNotFound(String),

    #[error("plugin '{0}' registered more than once")]
    Duplicate(String),
}
