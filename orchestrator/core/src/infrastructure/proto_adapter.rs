// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Wire Form Adapter
//!
//! Maps domain specifications onto the runtime protocol messages. Dates use
//! the job date layout, window durations their canonical string form, and
//! resource bodies travel as `google.protobuf.Struct`.

use crate::domain::job::JobSpec;
use crate::domain::project::ProjectSpec;
use crate::domain::resource::ResourceSpec;
use crate::domain::spec_error::SpecError;
use crate::infrastructure::job_spec_adapter::format_job_date;
use crate::infrastructure::resource_spec_adapter::ResourceSpecAdapter;
use crate::infrastructure::runtime_proto::{
    JobConfigItem, JobDependency, JobSpecHook, JobSpecification, ProjectSpecification,
    ResourceSpecification,
};
use prost_types::value::Kind;
use serde_json::{Map, Number, Value};

pub fn to_project_proto(project: &ProjectSpec) -> ProjectSpecification {
    ProjectSpecification {
        name: project.name.clone(),
        config: project
            .config
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Wire form of a job; a job without a resolved task cannot be sent
pub fn to_job_proto(spec: &JobSpec) -> Result<JobSpecification, SpecError> {
    let task_name = spec.task_name().ok_or(SpecError::MissingTaskUnit)?;

    let mut dependencies: Vec<JobDependency> = spec
        .dependencies
        .iter()
        .map(|(name, dep)| JobDependency {
            name: name.clone(),
            r#type: dep.dependency_type.as_str().to_string(),
        })
        .collect();
    dependencies.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(JobSpecification {
        version: spec.version,
        name: spec.name.clone(),
        owner: spec.owner.clone(),
        start_date: format_job_date(&spec.schedule.start_date),
        end_date: spec
            .schedule
            .end_date
            .as_ref()
            .map(format_job_date)
            .unwrap_or_default(),
        interval: spec.schedule.interval.clone(),
        depends_on_past: spec.behavior.depends_on_past,
        catch_up: spec.behavior.catch_up,
        task_name: task_name.to_string(),
        config: spec
            .task
            .config
            .iter()
            .map(|c| JobConfigItem {
                name: c.name.clone(),
                value: c.value.clone(),
            })
            .collect(),
        window_size: spec.task.window.size_string(),
        window_offset: spec.task.window.offset_string(),
        window_truncate_to: spec.task.window.truncate_to.as_str().to_string(),
        dependencies,
        assets: spec.assets.to_map().into_iter().collect(),
        hooks: spec
            .hooks
            .iter()
            .map(|h| JobSpecHook {
                name: h.unit.name().to_string(),
                config: h
                    .config
                    .iter()
                    .map(|c| JobConfigItem {
                        name: c.name.clone(),
                        value: c.value.clone(),
                    })
                    .collect(),
            })
            .collect(),
        description: spec.description.clone(),
        labels: spec
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}

/// Wire form of a resource; the type is re-checked against its datastore
pub fn to_resource_proto(spec: &ResourceSpec) -> Result<ResourceSpecification, SpecError> {
    ResourceSpecAdapter.check_type(&spec.resource_type, &spec.datastore)?;

    let body = match &spec.spec {
        Value::Null => None,
        Value::Object(map) => Some(object_to_struct(map)?),
        other => {
            return Err(SpecError::Serialization(format!(
                "resource '{}' spec must be a mapping, found {}",
                spec.name,
                json_type_name(other)
            )))
        }
    };

    Ok(ResourceSpecification {
        version: spec.version,
        name: spec.name.clone(),
        datastore: spec.datastore.name().to_string(),
        r#type: spec.resource_type.as_str().to_string(),
        spec: body,
        assets: spec
            .assets
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        labels: spec
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}

fn object_to_struct(map: &Map<String, Value>) -> Result<prost_types::Struct, SpecError> {
    let mut fields = std::collections::BTreeMap::new();
    for (key, value) in map {
        fields.insert(key.clone(), json_to_value(value)?);
    }
    Ok(prost_types::Struct {
        fields: fields.into_iter().collect(),
    })
}

fn json_to_value(value: &Value) -> Result<prost_types::Value, SpecError> {
    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(n.as_f64().ok_or_else(|| {
            SpecError::Serialization(format!("number {} cannot be represented as f64", n))
        })?),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(json_to_value).collect::<Result<_, _>>()?,
        }),
        Value::Object(map) => Kind::StructValue(object_to_struct(map)?),
    };
    Ok(prost_types::Value { kind: Some(kind) })
}

/// Decode a `Struct` back into a JSON document.
///
/// Numbers come back as floats unless they are whole and fit an `i64`.
pub fn struct_to_json(body: &prost_types::Struct) -> Value {
    Value::Object(
        body.fields
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    )
}

fn value_to_json(value: &prost_types::Value) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::NumberValue(n)) => {
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                Value::Number(Number::from(*n as i64))
            } else {
                Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(value_to_json).collect()),
        Some(Kind::StructValue(body)) => struct_to_json(body),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::{Datastore, ResourceType};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn resource(body: Value) -> ResourceSpec {
        ResourceSpec {
            version: 1,
            name: "warehouse.orders".to_string(),
            resource_type: ResourceType::new("table"),
            datastore: Arc::new(Datastore::new("bigquery", vec![ResourceType::new("table")])),
            spec: body,
            assets: BTreeMap::new(),
            labels: BTreeMap::from([("team".to_string(), "sales".to_string())]),
        }
    }

    #[test]
    fn test_resource_body_travels_as_struct() {
        let body = json!({
            "description": "orders",
            "expiration_hours": 48,
            "ratio": 0.5,
            "schema": [{"name": "id", "mode": "REQUIRED"}],
            "clustered": null,
        });
        let proto = to_resource_proto(&resource(body.clone())).unwrap();

        assert_eq!(proto.datastore, "bigquery");
        assert_eq!(proto.r#type, "table");
        assert_eq!(proto.labels.get("team").map(String::as_str), Some("sales"));
        let spec = proto.spec.unwrap();
        assert_eq!(struct_to_json(&spec), body);
    }

    #[test]
    fn test_scalar_resource_body_rejected() {
        let err = to_resource_proto(&resource(json!("table"))).unwrap_err();
        assert!(matches!(err, SpecError::Serialization(_)));

        assert!(to_resource_proto(&resource(Value::Null)).unwrap().spec.is_none());
    }

    #[test]
    fn test_resource_type_rechecked() {
        let mut spec = resource(Value::Null);
        spec.resource_type = ResourceType::new("view");
        assert!(matches!(
            to_resource_proto(&spec),
            Err(SpecError::Resolution { .. })
        ));
    }
}
