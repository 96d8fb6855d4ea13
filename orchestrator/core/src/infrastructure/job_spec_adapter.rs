// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Job Specification Adapter
//!
//! Converts between the human-authored `job.yaml` document and the canonical
//! [`JobSpec`] domain model.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects, and back
//! - **Anti-Corruption:** Translates the on-disk schema to the domain model
//!
//! # Document Format
//!
//! ```yaml
//! version: 1
//! name: orders-daily
//! owner: data-eng@example.com
//! schedule:
//!   start_date: "2021-02-18"
//!   interval: "0 2 * * *"
//! behavior:
//!   depends_on_past: false
//!   catch_up: true
//! task:
//!   name: bq2bq
//!   config:
//!     PROJECT: warehouse
//!     DATASET: sales
//!   window:
//!     size: 1M
//!     offset: "-24h"
//!     truncate_to: M
//! dependencies:
//!   - job: orders-raw
//! hooks:
//!   - name: transporter
//! ```
//!
//! `to_spec` is fail-fast: the first bad date, unknown plugin or malformed
//! window aborts the conversion and no domain object is produced.

use crate::domain::duration;
use crate::domain::job::{
    DependencyType, JobAssets, JobSpec, JobSpecBehavior, JobSpecConfigs, JobSpecDependency,
    JobSpecHook, JobSpecSchedule, JobSpecTask, JobSpecTaskWindow, TruncateTo, JOB_DATE_LAYOUT,
};
use crate::domain::plugin::{HookRepository, TaskPluginRepository};
use crate::domain::spec_error::{ResolutionTarget, SpecError};
use crate::infrastructure::spec_validation::SpecValidator;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// On-disk Model
// ============================================================================

/// A job as authored in `job.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: i32,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub schedule: JobSchedule,

    #[serde(default)]
    pub behavior: JobBehavior,

    #[serde(default)]
    pub task: JobTask,

    /// Inline assets; the local repository also merges files from `assets/`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub asset: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub dependencies: Vec<JobDependency>,

    #[serde(default)]
    pub hooks: Vec<JobHook>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSchedule {
    #[serde(default)]
    pub start_date: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_date: String,

    #[serde(default)]
    pub interval: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBehavior {
    #[serde(default)]
    pub depends_on_past: bool,

    #[serde(default)]
    pub catch_up: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTask {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "OrderedConfig::is_empty")]
    pub config: OrderedConfig,

    #[serde(default)]
    pub window: JobTaskWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTaskWindow {
    #[serde(default)]
    pub size: String,

    #[serde(default)]
    pub offset: String,

    #[serde(default)]
    pub truncate_to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHook {
    pub name: String,

    #[serde(default, skip_serializing_if = "OrderedConfig::is_empty")]
    pub config: OrderedConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDependency {
    #[serde(rename = "job")]
    pub job_name: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub dependency_type: String,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// Key/value configuration that keeps authoring order.
///
/// Written as a plain YAML mapping. Scalar values (numbers, booleans) are
/// read back as their string form; nested collections are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedConfig(pub Vec<(String, String)>);

impl OrderedConfig {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }
}

impl Serialize for OrderedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_yaml::Mapping preserves insertion order
        let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = scalar_to_string(&key)
                .ok_or_else(|| D::Error::custom("config keys must be scalars"))?;
            let value = scalar_to_string(&value).ok_or_else(|| {
                D::Error::custom(format!("config value for '{}' must be a scalar", key))
            })?;
            entries.push((key, value));
        }
        Ok(Self(entries))
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

impl From<&OrderedConfig> for JobSpecConfigs {
    fn from(config: &OrderedConfig) -> Self {
        config.0.iter().cloned().collect()
    }
}

impl From<&JobSpecConfigs> for OrderedConfig {
    fn from(config: &JobSpecConfigs) -> Self {
        Self(
            config
                .iter()
                .map(|item| (item.name.clone(), item.value.clone()))
                .collect(),
        )
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Converts on-disk [`Job`] documents to [`JobSpec`] and back
#[derive(Clone)]
pub struct JobSpecAdapter {
    task_repo: Arc<dyn TaskPluginRepository>,
    hook_repo: Arc<dyn HookRepository>,
    validator: Arc<SpecValidator>,
}

impl JobSpecAdapter {
    pub fn new(
        task_repo: Arc<dyn TaskPluginRepository>,
        hook_repo: Arc<dyn HookRepository>,
        validator: Arc<SpecValidator>,
    ) -> Self {
        Self {
            task_repo,
            hook_repo,
            validator,
        }
    }

    pub fn validator(&self) -> &SpecValidator {
        &self.validator
    }

    /// Validate and convert an authored job into its domain form
    pub fn to_spec(&self, job: &Job) -> Result<JobSpec, SpecError> {
        self.validator.validate_job(job)?;

        let start_date = parse_job_date("schedule.start_date", &job.schedule.start_date)?;
        let end_date = if job.schedule.end_date.is_empty() {
            None
        } else {
            Some(parse_job_date("schedule.end_date", &job.schedule.end_date)?)
        };

        // later entries for the same job overwrite earlier ones
        let mut dependencies = HashMap::with_capacity(job.dependencies.len());
        for dep in &job.dependencies {
            if !dep.dependency_type.is_empty()
                && DependencyType::parse_strict(&dep.dependency_type).is_none()
            {
                debug!(
                    "job '{}': unrecognized dependency type '{}' for '{}', treating as intra",
                    job.name, dep.dependency_type, dep.job_name
                );
            }
            dependencies.insert(
                dep.job_name.clone(),
                JobSpecDependency {
                    dependency_type: DependencyType::resolve(&dep.dependency_type),
                },
            );
        }

        let mut hooks = Vec::with_capacity(job.hooks.len());
        for hook in &job.hooks {
            let unit = self
                .hook_repo
                .get_by_name(&hook.name)
                .map_err(|_| SpecError::Resolution {
                    target: ResolutionTarget::Hook,
                    name: hook.name.clone(),
                })?;
            hooks.push(JobSpecHook {
                unit,
                config: JobSpecConfigs::from(&hook.config),
            });
        }

        let window = prepare_window(&job.task.window)?;

        let unit = self
            .task_repo
            .get_by_name(&job.task.name)
            .map_err(|_| SpecError::Resolution {
                target: ResolutionTarget::Task,
                name: job.task.name.clone(),
            })?;

        Ok(JobSpec {
            version: job.version,
            name: job.name.trim().to_string(),
            owner: job.owner.clone(),
            description: job.description.clone(),
            labels: job.labels.clone(),
            schedule: JobSpecSchedule {
                start_date,
                end_date,
                interval: job.schedule.interval.clone(),
            },
            behavior: JobSpecBehavior {
                depends_on_past: job.behavior.depends_on_past,
                catch_up: job.behavior.catch_up,
            },
            task: JobSpecTask {
                unit: Some(unit),
                config: JobSpecConfigs::from(&job.task.config),
                window,
            },
            assets: JobAssets::from_map(job.asset.clone()),
            dependencies,
            hooks,
        })
    }

    /// Convert a domain job back into its on-disk form.
    ///
    /// Window durations come back in canonical form (`1M` renders as
    /// `720h0m0s`). Dependencies are emitted sorted by job name.
    pub fn from_spec(&self, spec: &JobSpec) -> Result<Job, SpecError> {
        let task_name = spec.task_name().ok_or(SpecError::MissingTaskUnit)?;

        let mut dependencies: Vec<JobDependency> = spec
            .dependencies
            .iter()
            .map(|(name, dep)| JobDependency {
                job_name: name.clone(),
                dependency_type: dep.dependency_type.as_str().to_string(),
            })
            .collect();
        dependencies.sort_by(|a, b| a.job_name.cmp(&b.job_name));

        Ok(Job {
            version: spec.version,
            name: spec.name.clone(),
            owner: spec.owner.clone(),
            description: spec.description.clone(),
            schedule: JobSchedule {
                start_date: format_job_date(&spec.schedule.start_date),
                end_date: spec
                    .schedule
                    .end_date
                    .as_ref()
                    .map(format_job_date)
                    .unwrap_or_default(),
                interval: spec.schedule.interval.clone(),
            },
            behavior: JobBehavior {
                depends_on_past: spec.behavior.depends_on_past,
                catch_up: spec.behavior.catch_up,
            },
            task: JobTask {
                name: task_name.to_string(),
                config: OrderedConfig::from(&spec.task.config),
                window: JobTaskWindow {
                    size: spec.task.window.size_string(),
                    offset: spec.task.window.offset_string(),
                    truncate_to: spec.task.window.truncate_to.as_str().to_string(),
                },
            },
            asset: spec.assets.to_map(),
            labels: spec.labels.clone(),
            dependencies,
            hooks: spec
                .hooks
                .iter()
                .map(|hook| JobHook {
                    name: hook.unit.name().to_string(),
                    config: OrderedConfig::from(&hook.config),
                })
                .collect(),
        })
    }
}

/// Parse a `YYYY-MM-DD` date as midnight UTC
pub fn parse_job_date(field: &str, raw: &str) -> Result<DateTime<Utc>, SpecError> {
    // chrono accepts single digit months and days, the layout does not
    if raw.len() != 10 {
        return Err(SpecError::parse(field, raw, "expected a YYYY-MM-DD date"));
    }
    let date = NaiveDate::parse_from_str(raw, JOB_DATE_LAYOUT)
        .map_err(|e| SpecError::parse(field, raw, e))?;
    Ok(date.and_time(NaiveTime::default()).and_utc())
}

pub fn format_job_date(date: &DateTime<Utc>) -> String {
    date.format(JOB_DATE_LAYOUT).to_string()
}

fn prepare_window(window: &JobTaskWindow) -> Result<JobSpecTaskWindow, SpecError> {
    let mut resolved = JobSpecTaskWindow::default();

    if !window.truncate_to.is_empty() {
        resolved.truncate_to = window
            .truncate_to
            .parse::<TruncateTo>()
            .map_err(|e| SpecError::parse("task.window.truncate_to", &window.truncate_to, e))?;
    }

    // month notation first, standard notation only when no month token is present
    if !window.size.is_empty() {
        resolved.size = duration::parse(&window.size)
            .map_err(|e| SpecError::parse("task.window.size", &window.size, e))?;
    }
    if !window.offset.is_empty() {
        resolved.offset = duration::parse(&window.offset)
            .map_err(|e| SpecError::parse("task.window.offset", &window.offset, e))?;
    }

    Ok(resolved)
}
