// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Resource Authoring
//!
//! Creates an empty resource specification for one of a datastore's
//! resource types. The datastore specific `spec` body is filled in by hand
//! afterwards.

use crate::application::create_job::CreateError;
use crate::domain::repository::{RepositoryError, ResourceSpecRepository};
use crate::domain::resource::{Datastore, ResourceSpec, ResourceType};
use crate::domain::spec_error::SpecError;
use crate::infrastructure::local_store::{JOB_SPEC_FILE, RESOURCE_SPEC_FILE};
use crate::infrastructure::resource_spec_adapter::ResourceSpecAdapter;
use crate::infrastructure::spec_validation::{SpecValidator, RULE_MAX, RULE_MIN};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const RESOURCE_CONFIG_VERSION: i32 = 1;

/// Inputs for a new resource
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    pub name: String,
    pub resource_type: String,
}

impl ResourceTemplate {
    /// Resource name derived from a directory relative to the datastore
    /// root: `warehouse/orders` becomes `warehouse.orders`
    pub fn name_from_dir(relative: &Path) -> String {
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn validate_resource_name(validator: &SpecValidator, name: &str) -> Result<(), SpecError> {
    if name.contains('/') || name.contains('\\') {
        return Err(SpecError::validation("name", "`/` is not allowed"));
    }
    validator.check("name", name, RULE_MIN, "3")?;
    validator.check("name", name, RULE_MAX, "1024")
}

/// Validate and store a new resource of `datastore` in `dir`
pub fn create_resource(
    template: &ResourceTemplate,
    dir: &Path,
    datastore: &Arc<Datastore>,
    validator: &SpecValidator,
    repository: &dyn ResourceSpecRepository,
) -> Result<ResourceSpec, CreateError> {
    let name = template.name.trim();
    validate_resource_name(validator, name)?;

    let resource_type = ResourceType::new(template.resource_type.trim());
    ResourceSpecAdapter.check_type(&resource_type, datastore)?;

    match repository.get_by_name(name) {
        Ok(_) => return Err(CreateError::DuplicateResource(name.to_string())),
        Err(RepositoryError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if dir.join(JOB_SPEC_FILE).exists() || dir.join(RESOURCE_SPEC_FILE).exists() {
        return Err(CreateError::DirectoryOccupied(dir.to_path_buf()));
    }

    let spec = ResourceSpec {
        version: RESOURCE_CONFIG_VERSION,
        name: name.to_string(),
        resource_type,
        datastore: Arc::clone(datastore),
        spec: Value::Object(Map::new()),
        assets: BTreeMap::new(),
        labels: BTreeMap::new(),
    };
    repository.save_at(&spec, dir)?;
    info!(
        "Created {} resource '{}' for datastore '{}' in {:?}",
        spec.resource_type,
        spec.name,
        datastore.name(),
        dir
    );
    Ok(spec)
}
