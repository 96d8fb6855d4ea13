// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Job authoring commands
//!
//! Commands: job, hook, resource

use anyhow::{bail, Context, Result};
use clap::builder::PossibleValuesParser;
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use tributary_core::application::create_job::{
    add_hook, create_job, JobTemplate, PluginAnswer, UserAnswer, WindowPreset,
};
use tributary_core::application::create_resource::{create_resource, ResourceTemplate};
use tributary_core::domain::repository::JobSpecRepository;
use tributary_core::infrastructure::job_spec_adapter::format_job_date;

use crate::context::ProjectContext;

#[derive(Subcommand)]
pub enum CreateCommand {
    /// Create a new job specification
    Job {
        /// Job name
        #[arg(long)]
        name: String,

        /// Owner of the job
        #[arg(long)]
        owner: String,

        /// Task plugin the job runs
        #[arg(long)]
        task: String,

        /// Window preset
        #[arg(long, default_value = "daily", value_parser = PossibleValuesParser::new(WindowPreset::NAMES))]
        window: String,

        /// Schedule interval (cron expression or descriptor)
        #[arg(long, default_value = "0 2 * * *")]
        interval: String,

        /// First scheduled date, YYYY-MM-DD (default: today)
        #[arg(long, value_name = "DATE")]
        start_date: Option<String>,

        /// Directory for the job (default: <jobs.path>/<name>)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// YAML file with answers to the task's questions
        #[arg(long, value_name = "FILE")]
        answers: Option<PathBuf>,
    },

    /// Attach a hook to an existing job
    Hook {
        /// Job to modify
        #[arg(long)]
        job: String,

        /// Hook plugin name
        #[arg(long)]
        hook: String,

        /// Hook configuration as KEY=VALUE (repeatable)
        #[arg(long = "config", value_name = "KEY=VALUE")]
        config: Vec<String>,

        /// YAML file with answers to the hook's questions
        #[arg(long, value_name = "FILE")]
        answers: Option<PathBuf>,
    },

    /// Create a new resource specification in a datastore
    Resource {
        /// Datastore that owns the resource
        #[arg(long)]
        datastore: String,

        /// Resource type, one of the datastore's types
        #[arg(long = "type", value_name = "TYPE")]
        resource_type: String,

        /// Resource name (default: derived from --dir, `a/b` becomes `a.b`)
        #[arg(long, required_unless_present = "dir")]
        name: Option<String>,

        /// Directory relative to the datastore path (default: the name)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

pub async fn handle_command(command: CreateCommand, ctx: ProjectContext) -> Result<()> {
    match command {
        CreateCommand::Job {
            name,
            owner,
            task,
            window,
            interval,
            start_date,
            dir,
            answers,
        } => {
            let template = JobTemplate {
                name,
                owner,
                task,
                start_date: start_date
                    .unwrap_or_else(|| format_job_date(&chrono::Utc::now())),
                interval,
                window: WindowPreset::from_name(&window),
                task_answers: load_answers(answers.as_deref())?,
            };
            job(template, dir, &ctx)
        }
        CreateCommand::Hook {
            job,
            hook,
            config,
            answers,
        } => {
            let mut all = load_answers(answers.as_deref())?;
            all.extend(parse_config_pairs(&config)?);
            attach_hook(&job, &hook, &all, &ctx)
        }
        CreateCommand::Resource {
            datastore,
            resource_type,
            name,
            dir,
        } => resource(&datastore, resource_type, name, dir, &ctx),
    }
}

fn job(template: JobTemplate, dir: Option<PathBuf>, ctx: &ProjectContext) -> Result<()> {
    let repository = ctx.job_repository();
    let dir = dir.unwrap_or_else(|| repository.root().join(&template.name));
    let spec = create_job(&template, &dir, ctx.adapter(), &repository)
        .with_context(|| format!("Failed to create job '{}'", template.name))?;

    println!(
        "{}",
        format!("✓ Job '{}' created in {}", spec.name, dir.display()).green()
    );
    Ok(())
}

fn attach_hook(job: &str, hook: &str, answers: &[PluginAnswer], ctx: &ProjectContext) -> Result<()> {
    let repository = ctx.job_repository();
    let spec = repository
        .get_by_name(job)
        .with_context(|| format!("Failed to load job '{}'", job))?;

    let spec = add_hook(spec, hook, answers, ctx.plugins.as_ref())
        .with_context(|| format!("Failed to add hook '{}'", hook))?;
    repository
        .save(&spec)
        .with_context(|| format!("Failed to save job '{}'", job))?;

    println!(
        "{}",
        format!("✓ Hook '{}' added to job '{}'", hook, job).green()
    );
    Ok(())
}

fn resource(
    datastore: &str,
    resource_type: String,
    name: Option<String>,
    dir: Option<PathBuf>,
    ctx: &ProjectContext,
) -> Result<()> {
    let (datastore, repository) = ctx.resource_repository(datastore)?;
    let (name, dir) = resource_location(repository.root(), name, dir)?;
    let template = ResourceTemplate {
        name,
        resource_type,
    };

    let spec = create_resource(
        &template,
        &dir,
        &datastore,
        ctx.adapter().validator(),
        &repository,
    )
    .with_context(|| format!("Failed to create resource '{}'", template.name))?;

    println!(
        "{}",
        format!("✓ Resource '{}' created in {}", spec.name, dir.display()).green()
    );
    Ok(())
}

/// Resource name and target directory from whichever of the two was given
fn resource_location(
    root: &Path,
    name: Option<String>,
    dir: Option<PathBuf>,
) -> Result<(String, PathBuf)> {
    match (name, dir) {
        (Some(name), Some(dir)) => Ok((name, root.join(dir))),
        (Some(name), None) => {
            let dir = root.join(&name);
            Ok((name, dir))
        }
        (None, Some(dir)) => Ok((ResourceTemplate::name_from_dir(&dir), root.join(dir))),
        (None, None) => bail!("pass --name or --dir for the new resource"),
    }
}

/// Answers file: a YAML sequence of `{name, answer: {kind, value, index}}`
fn load_answers(path: Option<&Path>) -> Result<Vec<PluginAnswer>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers from {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Invalid answers file {:?}", path))
}

fn parse_config_pairs(pairs: &[String]) -> Result<Vec<PluginAnswer>> {
    pairs
        .iter()
        .map(|pair| {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("invalid config '{}', expected KEY=VALUE", pair);
            };
            if key.trim().is_empty() {
                bail!("invalid config '{}', key is empty", pair);
            }
            Ok(PluginAnswer {
                name: key.trim().to_string(),
                answer: UserAnswer::Text(value.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_pairs() {
        let answers =
            parse_config_pairs(&["BROKER=kafka:9092".to_string(), "FILTER=a=b".to_string()])
                .unwrap();
        assert_eq!(answers[0].name, "BROKER");
        assert_eq!(answers[0].answer, UserAnswer::Text("kafka:9092".to_string()));
        assert_eq!(answers[1].answer, UserAnswer::Text("a=b".to_string()));

        assert!(parse_config_pairs(&["BROKER".to_string()]).is_err());
        assert!(parse_config_pairs(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_resource_location() {
        let root = Path::new("datastore/bigquery");
        let (name, dir) =
            resource_location(root, None, Some(PathBuf::from("warehouse/orders"))).unwrap();
        assert_eq!(name, "warehouse.orders");
        assert_eq!(dir, root.join("warehouse/orders"));

        let (name, dir) = resource_location(root, Some("warehouse.orders".to_string()), None).unwrap();
        assert_eq!(name, "warehouse.orders");
        assert_eq!(dir, root.join("warehouse.orders"));

        assert!(resource_location(root, None, None).is_err());
    }

    #[test]
    fn test_create_resource_in_configured_datastore() {
        use tributary_core::domain::client_config::ClientConfig;
        use tributary_core::domain::repository::ResourceSpecRepository;

        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("datastore/bigquery");
        let config = ClientConfig::from_yaml_str(&format!(
            "datastores:\n  - name: bigquery\n    path: {}\n    types: [dataset, table]\n",
            root.display()
        ))
        .unwrap();
        let ctx = ProjectContext::from_config(config).unwrap();

        resource(
            "bigquery",
            "table".to_string(),
            None,
            Some(PathBuf::from("warehouse/orders")),
            &ctx,
        )
        .unwrap();
        let (_, repository) = ctx.resource_repository("bigquery").unwrap();
        assert_eq!(
            repository.get_by_name("warehouse.orders").unwrap().resource_type.as_str(),
            "table"
        );

        // same name again, and a type bigquery does not have
        assert!(resource(
            "bigquery",
            "table".to_string(),
            Some("warehouse.orders".to_string()),
            Some(PathBuf::from("elsewhere")),
            &ctx,
        )
        .is_err());
        assert!(resource(
            "bigquery",
            "view".to_string(),
            Some("warehouse.orders_view".to_string()),
            None,
            &ctx,
        )
        .is_err());
        assert!(resource("postgres", "table".to_string(), Some("a.b.c".to_string()), None, &ctx).is_err());
    }

    #[test]
    fn test_load_answers_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("answers.yaml");
        std::fs::write(
            &path,
            r#"
- name: PROJECT
  answer:
    kind: text
    value: warehouse
- name: LOAD_METHOD
  answer:
    kind: selected
    index: 1
    value: MERGE
"#,
        )
        .unwrap();

        let answers = load_answers(Some(&path)).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(
            answers[1].answer,
            UserAnswer::Selected {
                index: 1,
                value: "MERGE".to_string()
            }
        );
        assert!(load_answers(None).unwrap().is_empty());
    }
}
