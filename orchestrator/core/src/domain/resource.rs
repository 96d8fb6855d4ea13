// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Domain Model
//!
//! Resources are datastore objects (tables, datasets, views...) declared
//! alongside jobs. Their body is datastore specific and kept as a structured
//! document; only the datastore knows how to interpret it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Kind of object inside a datastore (e.g. `table`, `dataset`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A storage backend resources are deployed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datastore {
    name: String,
    types: Vec<ResourceType>,
}

impl Datastore {
    pub fn new(name: impl Into<String>, types: Vec<ResourceType>) -> Self {
        Self {
            name: name.into(),
            types,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[ResourceType] {
        &self.types
    }

    pub fn supports(&self, resource_type: &ResourceType) -> bool {
        self.types.contains(resource_type)
    }
}

/// Lookup of configured datastores
pub trait DatastoreRepository: Send + Sync {
    fn get_by_name(&self, name: &str) -> Option<Arc<Datastore>>;

    fn get_all(&self) -> Vec<Arc<Datastore>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSpec {
    pub version: i32,
    pub name: String,
    pub resource_type: ResourceType,
    pub datastore: Arc<Datastore>,
    pub spec: Value,
    pub assets: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}
