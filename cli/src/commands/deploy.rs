// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Deploy command
//!
//! Pushes the project's resources and jobs to the orchestrator and prints
//! per-item progress as acknowledgments arrive.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use tributary_core::application::deploy::DeploymentSession;
use tributary_core::domain::deployment::{
    DeployCategory, DeployEvent, DeployOptions, ProgressReporter,
};
use tributary_core::infrastructure::GrpcConnector;

use crate::context::ProjectContext;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Project to deploy
    #[arg(short, long)]
    pub project: String,

    /// Skip job deployment
    #[arg(long)]
    pub ignore_jobs: bool,

    /// Skip resource deployment
    #[arg(long)]
    pub ignore_resources: bool,
}

pub async fn execute(args: DeployArgs, ctx: ProjectContext) -> Result<()> {
    let project = args.project;
    if project.trim().is_empty() {
        bail!("project name must not be empty");
    }

    let mut options = DeployOptions::new(project.clone());
    options.ignore_jobs = args.ignore_jobs;
    options.ignore_resources = args.ignore_resources;
    options.dial_timeout = ctx.config.timeouts.dial;
    options.deploy_timeout = ctx.config.timeouts.deploy;

    let mut session = DeploymentSession::new(
        GrpcConnector::new(ctx.config.host.clone()),
        options,
        Arc::new(ctx.job_repository()),
        ctx.datastores.clone(),
    )
    .with_project_config(ctx.config.project.config.clone());
    for source in ctx.resource_sources() {
        session = session.with_resource_source(source);
    }

    println!("deploying project {} at {}", project.bold(), ctx.config.host);
    println!("please wait...");
    info!("Starting deployment of '{}'", project);

    let started = Instant::now();
    let mut reporter = ConsoleReporter;
    session.run(&mut reporter).await?;

    println!("{}", "deployment completed successfully".green());
    println!("deployment took {:.2?}", started.elapsed());
    Ok(())
}

/// Prints deployment events to stdout
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&mut self, event: &DeployEvent) {
        if let Some(line) = render(event) {
            println!("{}", line);
        }
    }
}

/// Console line for an event, if it has one
pub fn render(event: &DeployEvent) -> Option<String> {
    match event {
        DeployEvent::ProjectRegistered { .. } => Some("updated project configuration".to_string()),
        DeployEvent::ItemDeployed {
            name,
            acknowledged,
            total,
            ..
        } => Some(format!(
            "{}/{}. {} successfully deployed",
            acknowledged, total, name
        )),
        DeployEvent::Progress { name, message, .. } => {
            Some(format!("info '{}': {}", name, message).yellow().to_string())
        }
        DeployEvent::CategoryCompleted { category } => Some(match category {
            DeployCategory::Resources => "deployed resources".to_string(),
            DeployCategory::Jobs => "deployed jobs".to_string(),
        }),
        DeployEvent::CategorySkipped { category } => Some(match category {
            DeployCategory::Resources => "skipping resource deployment".to_string(),
            DeployCategory::Jobs => "skipping job deployment".to_string(),
        }),
        DeployEvent::StateChanged { .. } | DeployEvent::BatchSent { .. } => None,
    }
}
