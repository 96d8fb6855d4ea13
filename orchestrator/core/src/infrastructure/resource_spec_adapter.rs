// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Resource Specification Adapter
//!
//! Converts `resource.yaml` documents into [`ResourceSpec`] values bound to
//! a datastore. The `spec` body is datastore specific and passes through as
//! a structured document; only the resource type is checked here.
//!
//! ```yaml
//! version: 1
//! name: warehouse.sales.orders
//! type: table
//! labels:
//!   team: sales
//! spec:
//!   schema:
//!     - name: order_id
//!       type: STRING
//! ```

use crate::domain::resource::{Datastore, ResourceSpec, ResourceType};
use crate::domain::spec_error::{ResolutionTarget, SpecError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A resource as authored in `resource.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub version: i32,

    pub name: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub spec: Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSpecAdapter;

impl ResourceSpecAdapter {
    /// Bind an authored resource to its datastore
    pub fn to_spec(
        &self,
        resource: &Resource,
        datastore: &Arc<Datastore>,
        assets: BTreeMap<String, String>,
    ) -> Result<ResourceSpec, SpecError> {
        let name = resource.name.trim();
        if name.is_empty() {
            return Err(SpecError::validation("name", "resource name cannot be empty"));
        }

        let resource_type = ResourceType::new(resource.resource_type.trim());
        self.check_type(&resource_type, datastore)?;

        Ok(ResourceSpec {
            version: resource.version,
            name: name.to_string(),
            resource_type,
            datastore: Arc::clone(datastore),
            spec: resource.spec.clone(),
            assets,
            labels: resource.labels.clone(),
        })
    }

    pub fn from_spec(&self, spec: &ResourceSpec) -> Resource {
        Resource {
            version: spec.version,
            name: spec.name.clone(),
            resource_type: spec.resource_type.as_str().to_string(),
            labels: spec.labels.clone(),
            spec: spec.spec.clone(),
        }
    }

    /// The resource type must be one the datastore declares
    pub fn check_type(
        &self,
        resource_type: &ResourceType,
        datastore: &Datastore,
    ) -> Result<(), SpecError> {
        if datastore.supports(resource_type) {
            Ok(())
        } else {
            Err(SpecError::Resolution {
                target: ResolutionTarget::ResourceType,
                name: format!("{} (datastore {})", resource_type, datastore.name()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spec_error::ErrorKind;

    fn bigquery() -> Arc<Datastore> {
        Arc::new(Datastore::new(
            "bigquery",
            vec![ResourceType::new("dataset"), ResourceType::new("table")],
        ))
    }

    #[test]
    fn test_to_spec_keeps_body() {
        let resource: Resource = serde_yaml::from_str(
            r#"
version: 1
name: warehouse.sales.orders
type: table
spec:
  partition:
    field: created_at
"#,
        )
        .unwrap();

        let spec = ResourceSpecAdapter
            .to_spec(&resource, &bigquery(), BTreeMap::new())
            .unwrap();
        assert_eq!(spec.datastore.name(), "bigquery");
        assert_eq!(spec.spec["partition"]["field"], "created_at");
        assert_eq!(ResourceSpecAdapter.from_spec(&spec), resource);
    }

    #[test]
    fn test_unsupported_type_is_resolution_error() {
        let resource = Resource {
            version: 1,
            name: "warehouse.sales.orders_view".to_string(),
            resource_type: "view".to_string(),
            ..Default::default()
        };

        let err = ResourceSpecAdapter
            .to_spec(&resource, &bigquery(), BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
