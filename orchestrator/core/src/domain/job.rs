// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Job Domain Model
//!
//! Canonical job specification consumed by the orchestrator. This is the
//! target of the on-disk adapter (`crate::infrastructure::job_spec_adapter`)
//! and the source of the wire form sent during deployment.
//!
//! Compared to the on-disk shape:
//!
//! - schedule dates are absolute UTC timestamps,
//! - the task window is a resolved `{size, offset, truncate_to}` triple,
//! - dependencies are keyed by job name (later entries overwrite earlier ones),
//! - task and hooks hold resolved plugin handles instead of names,
//! - config is an ordered list of `{name, value}` pairs.

use crate::domain::duration::format_duration;
use crate::domain::plugin::{HookPlugin, TaskPlugin};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Layout of schedule dates, both on disk and on the wire
pub const JOB_DATE_LAYOUT: &str = "%Y-%m-%d";

/// Current on-disk job specification version
pub const JOB_CONFIG_VERSION: i32 = 1;

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub version: i32,
    pub name: String,
    pub owner: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    pub schedule: JobSpecSchedule,
    pub behavior: JobSpecBehavior,
    pub task: JobSpecTask,
    pub assets: JobAssets,
    pub dependencies: HashMap<String, JobSpecDependency>,
    pub hooks: Vec<JobSpecHook>,
}

impl JobSpec {
    /// Whether a hook with the given plugin name is attached
    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.iter().any(|h| h.unit.name() == name)
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task.unit.as_ref().map(|u| u.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpecSchedule {
    pub start_date: DateTime<Utc>,
    /// `None` means the schedule is open ended
    pub end_date: Option<DateTime<Utc>>,
    pub interval: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSpecBehavior {
    pub depends_on_past: bool,
    pub catch_up: bool,
}

#[derive(Debug, Clone)]
pub struct JobSpecTask {
    pub unit: Option<Arc<dyn TaskPlugin>>,
    pub config: JobSpecConfigs,
    pub window: JobSpecTaskWindow,
}

#[derive(Debug, Clone)]
pub struct JobSpecHook {
    pub unit: Arc<dyn HookPlugin>,
    pub config: JobSpecConfigs,
}

// ============================================================================
// Task Window
// ============================================================================

/// Calendar boundary a window is aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruncateTo {
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "M")]
    Month,
}

impl TruncateTo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
            Self::Month => "M",
        }
    }
}

impl Default for TruncateTo {
    fn default() -> Self {
        Self::Day
    }
}

impl fmt::Display for TruncateTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruncateTo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h" => Ok(Self::Hour),
            "d" => Ok(Self::Day),
            "w" => Ok(Self::Week),
            "M" => Ok(Self::Month),
            other => Err(format!("unknown truncation unit '{}', expected one of h|d|w|M", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSpecTaskWindow {
    pub size: TimeDelta,
    pub offset: TimeDelta,
    pub truncate_to: TruncateTo,
}

impl JobSpecTaskWindow {
    pub fn size_string(&self) -> String {
        format_duration(self.size)
    }

    pub fn offset_string(&self) -> String {
        format_duration(self.offset)
    }
}

impl Default for JobSpecTaskWindow {
    /// A one day window with no offset, truncated to the day
    fn default() -> Self {
        Self {
            size: TimeDelta::hours(24),
            offset: TimeDelta::zero(),
            truncate_to: TruncateTo::Day,
        }
    }
}

// ============================================================================
// Config, Assets, Dependencies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpecConfigItem {
    pub name: String,
    pub value: String,
}

/// Ordered task/hook configuration; authoring order is preserved end to end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpecConfigs(pub Vec<JobSpecConfigItem>);

impl JobSpecConfigs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value.as_str())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(JobSpecConfigItem {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobSpecConfigItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for JobSpecConfigs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| JobSpecConfigItem { name, value })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobAssets(BTreeMap<String, String>);

impl JobAssets {
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a dependency relates to the depending job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Same project
    Intra,
    /// Another project on the same orchestrator
    Inter,
    /// Outside the orchestrator
    Extra,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intra => "intra",
            Self::Inter => "inter",
            Self::Extra => "extra",
        }
    }

    /// Resolve an authored type string.
    ///
    /// Unknown and empty values resolve to [`DependencyType::Intra`] without an
    /// error. A misspelled `inter`/`extra` is therefore indistinguishable from
    /// an intra-project dependency; callers wanting strictness must check with
    /// [`DependencyType::parse_strict`] first.
    pub fn resolve(raw: &str) -> Self {
        Self::parse_strict(raw).unwrap_or(Self::Intra)
    }

    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw {
            "intra" => Some(Self::Intra),
            "inter" => Some(Self::Inter),
            "extra" => Some(Self::Extra),
            _ => None,
        }
    }
}

impl Default for DependencyType {
    fn default() -> Self {
        Self::Intra
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSpecDependency {
    pub dependency_type: DependencyType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_type_fallback() {
        assert_eq!(DependencyType::resolve("inter"), DependencyType::Inter);
        assert_eq!(DependencyType::resolve("extra"), DependencyType::Extra);
        assert_eq!(DependencyType::resolve("bogus"), DependencyType::Intra);
        assert_eq!(DependencyType::resolve(""), DependencyType::Intra);
        assert_eq!(DependencyType::parse_strict("bogus"), None);
    }

    #[test]
    fn test_window_defaults() {
        let window = JobSpecTaskWindow::default();
        assert_eq!(window.size_string(), "24h0m0s");
        assert_eq!(window.offset_string(), "0s");
        assert_eq!(window.truncate_to.as_str(), "d");
    }

    #[test]
    fn test_config_preserves_order() {
        let mut config = JobSpecConfigs::default();
        config.push("ZETA", "1");
        config.push("ALPHA", "2");
        let names: Vec<_> = config.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ZETA", "ALPHA"]);
        assert_eq!(config.get("ALPHA"), Some("2"));
    }

    #[test]
    fn test_truncate_to_parsing() {
        assert_eq!("M".parse::<TruncateTo>().unwrap(), TruncateTo::Month);
        assert!("m".parse::<TruncateTo>().is_err());
    }
}
