// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Job Authoring
//!
//! Non-interactive building blocks for creating jobs and attaching hooks.
//! Answers are collected by the caller (flags, answer files) and passed in
//! as typed [`UserAnswer`] values.

use crate::domain::job::{JobSpec, JobSpecConfigs, JobSpecHook, JOB_CONFIG_VERSION};
use crate::domain::plugin::HookRepository;
use crate::domain::repository::{JobSpecRepository, RepositoryError};
use crate::domain::spec_error::{ResolutionTarget, SpecError};
use crate::infrastructure::job_spec_adapter::{
    Job, JobBehavior, JobSchedule, JobSpecAdapter, JobTask, JobTaskWindow, OrderedConfig,
};
use crate::infrastructure::local_store::{JOB_SPEC_FILE, RESOURCE_SPEC_FILE};
use crate::infrastructure::spec_validation::RULE_JOB_NAME;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ORCHESTRATOR_LABEL: &str = "orchestrator";
pub const ORCHESTRATOR_LABEL_VALUE: &str = "tributary";

// ============================================================================
// Window presets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPreset {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl WindowPreset {
    pub const NAMES: [&'static str; 4] = ["hourly", "daily", "weekly", "monthly"];

    /// Unknown names fall back to [`WindowPreset::Daily`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "hourly" => Self::Hourly,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            other => {
                debug!("Unknown window preset '{}', using daily", other);
                Self::Daily
            }
        }
    }

    pub fn window(&self) -> JobTaskWindow {
        let (size, truncate_to) = match self {
            Self::Hourly => ("1h", "h"),
            Self::Daily => ("24h", "h"),
            Self::Weekly => ("168h", "w"),
            Self::Monthly => ("720h", "M"),
        };
        JobTaskWindow {
            size: size.to_string(),
            offset: "0".to_string(),
            truncate_to: truncate_to.to_string(),
        }
    }
}

// ============================================================================
// Answers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("unsupported answer kind '{0}'")]
    UnsupportedKind(String),

    #[error("answer of kind '{kind}' is missing {field}")]
    Missing { kind: String, field: &'static str },
}

/// A single answer to a plugin question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnswer", into = "RawAnswer")]
pub enum UserAnswer {
    Text(String),
    Selected { index: usize, value: String },
    Numeric(i64),
}

impl UserAnswer {
    /// Answer as stored in task/hook configuration
    pub fn to_answer_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Selected { value, .. } => value.clone(),
            Self::Numeric(n) => n.to_string(),
        }
    }
}

/// Serialized form of an answer: `{kind, value, index}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAnswer {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl TryFrom<RawAnswer> for UserAnswer {
    type Error = AnswerError;

    fn try_from(raw: RawAnswer) -> Result<Self, Self::Error> {
        let missing = |field| AnswerError::Missing {
            kind: raw.kind.clone(),
            field,
        };
        match raw.kind.as_str() {
            "text" => match &raw.value {
                Some(serde_yaml::Value::String(s)) => Ok(Self::Text(s.clone())),
                _ => Err(missing("a string value")),
            },
            "selected" => {
                let index = raw.index.ok_or_else(|| missing("an index"))?;
                match &raw.value {
                    Some(serde_yaml::Value::String(s)) => Ok(Self::Selected {
                        index,
                        value: s.clone(),
                    }),
                    _ => Err(missing("a string value")),
                }
            }
            "numeric" => raw
                .value
                .as_ref()
                .and_then(serde_yaml::Value::as_i64)
                .map(Self::Numeric)
                .ok_or_else(|| missing("an integer value")),
            other => Err(AnswerError::UnsupportedKind(other.to_string())),
        }
    }
}

impl From<UserAnswer> for RawAnswer {
    fn from(answer: UserAnswer) -> Self {
        match answer {
            UserAnswer::Text(text) => RawAnswer {
                kind: "text".to_string(),
                value: Some(serde_yaml::Value::String(text)),
                index: None,
            },
            UserAnswer::Selected { index, value } => RawAnswer {
                kind: "selected".to_string(),
                value: Some(serde_yaml::Value::String(value)),
                index: Some(index),
            },
            UserAnswer::Numeric(n) => RawAnswer {
                kind: "numeric".to_string(),
                value: Some(serde_yaml::Value::Number(n.into())),
                index: None,
            },
        }
    }
}

/// Named answer, in question order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginAnswer {
    pub name: String,
    pub answer: UserAnswer,
}

/// Configuration items from answers; question order is kept
pub fn answers_to_config(answers: &[PluginAnswer]) -> JobSpecConfigs {
    answers
        .iter()
        .map(|a| (a.name.clone(), a.answer.to_answer_string()))
        .collect()
}

// ============================================================================
// Job creation
// ============================================================================

#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("job with the name '{0}' already exists")]
    DuplicateJob(String),

    #[error("resource with the name '{0}' already exists")]
    DuplicateResource(String),

    #[error("directory {0:?} already holds a specification")]
    DirectoryOccupied(PathBuf),

    #[error("hook '{hook}' already exists for job '{job}'")]
    DuplicateHook { job: String, hook: String },
}

/// Inputs for a new job
#[derive(Debug, Clone)]
pub struct JobTemplate {
    pub name: String,
    pub owner: String,
    pub task: String,
    pub start_date: String,
    pub interval: String,
    pub window: WindowPreset,
    pub task_answers: Vec<PluginAnswer>,
}

impl JobTemplate {
    /// The on-disk job this template produces
    pub fn to_job(&self) -> Job {
        let config = OrderedConfig(
            self.task_answers
                .iter()
                .map(|a| (a.name.clone(), a.answer.to_answer_string()))
                .collect(),
        );

        Job {
            version: JOB_CONFIG_VERSION,
            name: self.name.clone(),
            owner: self.owner.clone(),
            description: String::new(),
            schedule: JobSchedule {
                start_date: self.start_date.clone(),
                end_date: String::new(),
                interval: self.interval.clone(),
            },
            behavior: JobBehavior {
                depends_on_past: false,
                catch_up: true,
            },
            task: JobTask {
                name: self.task.clone(),
                config,
                window: self.window.window(),
            },
            asset: BTreeMap::new(),
            labels: BTreeMap::from([(
                ORCHESTRATOR_LABEL.to_string(),
                ORCHESTRATOR_LABEL_VALUE.to_string(),
            )]),
            dependencies: Vec::new(),
            hooks: Vec::new(),
        }
    }
}

/// Validate, adapt and store a new job in `dir`
pub fn create_job(
    template: &JobTemplate,
    dir: &Path,
    adapter: &JobSpecAdapter,
    repository: &dyn JobSpecRepository,
) -> Result<JobSpec, CreateError> {
    adapter
        .validator()
        .check("name", &template.name, RULE_JOB_NAME, "")?;

    match repository.get_by_name(&template.name) {
        Ok(_) => return Err(CreateError::DuplicateJob(template.name.clone())),
        Err(RepositoryError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if dir.join(JOB_SPEC_FILE).exists() || dir.join(RESOURCE_SPEC_FILE).exists() {
        return Err(CreateError::DirectoryOccupied(dir.to_path_buf()));
    }

    let spec = adapter.to_spec(&template.to_job())?;
    repository.save_at(&spec, dir)?;
    info!("Created job '{}' in {:?}", spec.name, dir);
    Ok(spec)
}

/// Attach a hook to a job; a hook can be attached only once
pub fn add_hook(
    mut spec: JobSpec,
    hook_name: &str,
    answers: &[PluginAnswer],
    hooks: &dyn HookRepository,
) -> Result<JobSpec, CreateError> {
    if spec.has_hook(hook_name) {
        return Err(CreateError::DuplicateHook {
            job: spec.name.clone(),
            hook: hook_name.to_string(),
        });
    }

    let unit = hooks.get_by_name(hook_name).map_err(|_| SpecError::Resolution {
        target: ResolutionTarget::Hook,
        name: hook_name.to_string(),
    })?;
    spec.hooks.push(JobSpecHook {
        unit,
        config: answers_to_config(answers),
    });
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plugin::HookKind;
    use crate::infrastructure::local_store::LocalJobSpecRepository;
    use crate::infrastructure::registry::{DeclaredHookPlugin, DeclaredTaskPlugin, PluginRegistry};
    use crate::infrastructure::spec_validation::SpecValidator;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry() -> Arc<PluginRegistry> {
        let mut registry = PluginRegistry::new();
        registry
            .register_task(Arc::new(DeclaredTaskPlugin::new("bq2bq", "")))
            .unwrap();
        registry
            .register_hook(Arc::new(DeclaredHookPlugin::new("transporter", "", HookKind::Post)))
            .unwrap();
        Arc::new(registry)
    }

    fn adapter() -> JobSpecAdapter {
        let registry = registry();
        JobSpecAdapter::new(registry.clone(), registry, Arc::new(SpecValidator::default()))
    }

    fn template(name: &str) -> JobTemplate {
        JobTemplate {
            name: name.to_string(),
            owner: "data-eng".to_string(),
            task: "bq2bq".to_string(),
            start_date: "2021-02-18".to_string(),
            interval: "0 2 * * *".to_string(),
            window: WindowPreset::from_name("monthly"),
            task_answers: vec![
                PluginAnswer {
                    name: "PROJECT".to_string(),
                    answer: UserAnswer::Text("warehouse".to_string()),
                },
                PluginAnswer {
                    name: "LOAD_METHOD".to_string(),
                    answer: UserAnswer::Selected {
                        index: 1,
                        value: "APPEND".to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_window_presets() {
        let hourly = WindowPreset::Hourly.window();
        assert_eq!((hourly.size.as_str(), hourly.truncate_to.as_str()), ("1h", "h"));
        assert_eq!(WindowPreset::from_name("fortnightly"), WindowPreset::Daily);
        assert_eq!(WindowPreset::Monthly.window().size, "720h");
        assert_eq!(WindowPreset::Weekly.window().truncate_to, "w");
    }

    #[test]
    fn test_answers() {
        assert_eq!(UserAnswer::Numeric(42).to_answer_string(), "42");

        let parsed: Vec<PluginAnswer> = serde_yaml::from_str(
            "- name: MODE\n  answer: {kind: selected, index: 0, value: full}\n- name: RETRIES\n  answer: {kind: numeric, value: 3}\n",
        )
        .unwrap();
        assert_eq!(answers_to_config(&parsed).get("MODE"), Some("full"));
        assert_eq!(answers_to_config(&parsed).get("RETRIES"), Some("3"));

        let raw = RawAnswer {
            kind: "date".to_string(),
            ..Default::default()
        };
        assert_eq!(
            UserAnswer::try_from(raw).unwrap_err(),
            AnswerError::UnsupportedKind("date".to_string())
        );
        assert!(serde_yaml::from_str::<UserAnswer>("{kind: date, value: x}").is_err());
    }

    #[test]
    fn test_create_job_from_template() {
        let tmp = TempDir::new().unwrap();
        let adapter = adapter();
        let repo = LocalJobSpecRepository::new(tmp.path(), adapter.clone());

        let spec = create_job(&template("orders"), &tmp.path().join("orders"), &adapter, &repo).unwrap();
        assert!(spec.behavior.catch_up);
        assert!(!spec.behavior.depends_on_past);
        assert_eq!(spec.labels.get("orchestrator").map(String::as_str), Some("tributary"));
        assert_eq!(spec.task.config.get("LOAD_METHOD"), Some("APPEND"));

        let reloaded = repo.get_by_name("orders").unwrap();
        assert_eq!(reloaded.task.window.size_string(), "720h0m0s");

        let err = create_job(&template("orders"), &tmp.path().join("again"), &adapter, &repo).unwrap_err();
        assert!(matches!(err, CreateError::DuplicateJob(_)));

        let err = create_job(&template("other"), &tmp.path().join("orders"), &adapter, &repo).unwrap_err();
        assert!(matches!(err, CreateError::DirectoryOccupied(_)));

        let err = create_job(&template("team/orders"), &tmp.path().join("x"), &adapter, &repo).unwrap_err();
        assert!(matches!(err, CreateError::Spec(SpecError::Validation { .. })));
    }

    #[test]
    fn test_add_hook_once() {
        let adapter = adapter();
        let spec = adapter.to_spec(&template("orders").to_job()).unwrap();
        let registry = registry();

        let answers = vec![PluginAnswer {
            name: "FILTER".to_string(),
            answer: UserAnswer::Text("x > 0".to_string()),
        }];
        let spec = add_hook(spec, "transporter", &answers, registry.as_ref()).unwrap();
        assert!(spec.has_hook("transporter"));

        let err = add_hook(spec, "transporter", &[], registry.as_ref()).unwrap_err();
        assert!(matches!(err, CreateError::DuplicateHook { .. }));
    }
}
