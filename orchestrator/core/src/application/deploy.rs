// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Session
//!
//! Pushes a project's resource and job specifications to the orchestrator.
//!
//! # Protocol
//!
//! 1. Dial the orchestrator within the dial timeout.
//! 2. Register the project configuration. Failure here stops the session
//!    before anything is transferred.
//! 3. Unless skipped, for every datastore: adapt all resources, send them in
//!    one request, then read the acknowledgment stream to its end.
//! 4. Unless skipped, adapt all jobs, send them in one request and read the
//!    acknowledgment stream.
//!
//! Every streamed message is either an *ack* (terminal for one item, carrying
//! `success`) or a progress note. The first ack with `success: false` ends
//! the session immediately; acks for the remaining items of that batch are
//! never read, so their outcome is unknown to the client.
//!
//! Steps 2-4 share one deadline. It travels with every call as the gRPC
//! timeout, and each call and stream read is also bounded by it locally;
//! when it fires the in-flight call is dropped, which cancels it.
//!
//! Categories run strictly one after another and a failure in resources
//! means jobs are never attempted. A failed session is not resumable; the
//! caller starts over.

use crate::domain::deployment::{
    CategoryReport, DeployCategory, DeployEvent, DeployOptions, DeploymentSummary,
    ProgressReporter, SessionState,
};
use crate::domain::project::ProjectSpec;
use crate::domain::repository::{JobSpecRepository, RepositoryError, ResourceSpecRepository};
use crate::domain::resource::{Datastore, DatastoreRepository};
use crate::domain::spec_error::{ErrorKind, SpecError};
use crate::infrastructure::proto_adapter::{to_job_proto, to_project_proto, to_resource_proto};
use crate::infrastructure::runtime_client::{
    AckStream, ConnectError, DeployAck, RuntimeConnector, RuntimeTransport,
};
use crate::infrastructure::runtime_proto::{
    DeployJobSpecificationRequest, DeployResourceSpecificationRequest, RegisterProjectRequest,
};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tonic::{Code, Status};
use tracing::{debug, info, warn};

const OP_CONNECT: &str = "connect";
const OP_REGISTER: &str = "failed to update project configurations";
const OP_RESOURCES: &str = "resource deployment failed";
const OP_JOBS: &str = "job deployment failed";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("{operation}: failed to serialize '{entity}': {source}")]
    Spec {
        operation: &'static str,
        entity: String,
        #[source]
        source: SpecError,
    },

    #[error("can't reach orchestrator at {host}")]
    Unreachable { host: String },

    #[error("{operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: unable to deploy '{entity}': {message}")]
    Protocol {
        operation: &'static str,
        entity: String,
        message: String,
    },

    #[error("{operation}: deployment process took too long, timing out")]
    Timeout { operation: &'static str },

    #[error("{operation}: {source}")]
    Repository {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },

    #[error("unsupported datastore: {0}")]
    UnsupportedDatastore(String),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spec { source, .. } => source.kind(),
            Self::Unreachable { .. } | Self::Transport { .. } => ErrorKind::Transport,
            Self::Protocol { .. } => ErrorKind::ProtocolFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Repository {
                source: RepositoryError::Spec { source, .. },
                ..
            } => source.kind(),
            Self::Repository { .. } => ErrorKind::Storage,
            Self::UnsupportedDatastore(_) => ErrorKind::Resolution,
        }
    }

    fn from_status(operation: &'static str, status: Status) -> Self {
        if status.code() == Code::DeadlineExceeded {
            Self::Timeout { operation }
        } else {
            Self::Transport {
                operation,
                message: format!("{:?}: {}", status.code(), status.message()),
            }
        }
    }

    fn from_connect(error: ConnectError) -> Self {
        match error {
            ConnectError::TimedOut { host, .. } => Self::Unreachable { host },
            other => Self::Transport {
                operation: OP_CONNECT,
                message: other.to_string(),
            },
        }
    }
}

/// Opens the resource repository of a datastore once it has been resolved
pub type ResourceRepositoryFactory =
    Arc<dyn Fn(Arc<Datastore>) -> Arc<dyn ResourceSpecRepository> + Send + Sync>;

/// Resource specs for one datastore, sent as one batch
#[derive(Clone)]
pub struct ResourceSource {
    datastore: String,
    open: ResourceRepositoryFactory,
}

impl ResourceSource {
    pub fn new<F>(datastore: impl Into<String>, open: F) -> Self
    where
        F: Fn(Arc<Datastore>) -> Arc<dyn ResourceSpecRepository> + Send + Sync + 'static,
    {
        Self {
            datastore: datastore.into(),
            open: Arc::new(open),
        }
    }

    pub fn datastore(&self) -> &str {
        &self.datastore
    }
}

impl fmt::Debug for ResourceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSource")
            .field("datastore", &self.datastore)
            .finish_non_exhaustive()
    }
}

/// One deployment invocation; consumed by [`DeploymentSession::run`]
pub struct DeploymentSession<C> {
    connector: C,
    options: DeployOptions,
    project_config: BTreeMap<String, String>,
    jobs: Arc<dyn JobSpecRepository>,
    datastores: Arc<dyn DatastoreRepository>,
    resource_sources: Vec<ResourceSource>,
    state: SessionState,
}

impl<C: RuntimeConnector> DeploymentSession<C> {
    pub fn new(
        connector: C,
        options: DeployOptions,
        jobs: Arc<dyn JobSpecRepository>,
        datastores: Arc<dyn DatastoreRepository>,
    ) -> Self {
        Self {
            connector,
            options,
            project_config: BTreeMap::new(),
            jobs,
            datastores,
            resource_sources: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Global configuration sent with the project registration
    pub fn with_project_config(mut self, config: BTreeMap<String, String>) -> Self {
        self.project_config = config;
        self
    }

    /// Add a datastore batch; batches are sent in the order added
    pub fn with_resource_source(mut self, source: ResourceSource) -> Self {
        self.resource_sources.push(source);
        self
    }

    /// Run the whole deployment, reporting events as they happen
    pub async fn run(
        mut self,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<DeploymentSummary, DeployError> {
        match self.execute(reporter).await {
            Ok(summary) => {
                self.transition(SessionState::Completed, reporter);
                info!("Deployment of project '{}' completed", self.options.project);
                Ok(summary)
            }
            Err(e) => {
                warn!("Deployment of project '{}' failed: {}", self.options.project, e);
                self.transition(SessionState::Failed, reporter);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: SessionState, reporter: &mut dyn ProgressReporter) {
        if !self.state.can_transition_to(next) {
            debug!("Ignoring session transition {} -> {}", self.state, next);
            return;
        }
        let from = self.state;
        self.state = next;
        reporter.report(&DeployEvent::StateChanged { from, to: next });
    }

    async fn execute(
        &mut self,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<DeploymentSummary, DeployError> {
        self.transition(SessionState::Connecting, reporter);
        info!(
            "Deploying project '{}' to {}",
            self.options.project,
            self.connector.host()
        );
        let mut transport = self
            .connector
            .connect(self.options.dial_timeout)
            .await
            .map_err(DeployError::from_connect)?;

        let deadline = Instant::now() + self.options.deploy_timeout;

        self.transition(SessionState::RegisteringProject, reporter);
        self.register_project(&mut transport, deadline).await?;
        reporter.report(&DeployEvent::ProjectRegistered {
            project: self.options.project.clone(),
        });

        let mut summary = DeploymentSummary {
            project: self.options.project.clone(),
            resources: Vec::new(),
            jobs: None,
        };

        if self.options.ignore_resources {
            reporter.report(&DeployEvent::CategorySkipped {
                category: DeployCategory::Resources,
            });
        } else {
            self.transition(SessionState::DeployingResources, reporter);
            for source in &self.resource_sources {
                let report = self
                    .deploy_resources(&mut transport, source, deadline, reporter)
                    .await?;
                summary.resources.push(report);
            }
            reporter.report(&DeployEvent::CategoryCompleted {
                category: DeployCategory::Resources,
            });
        }

        if self.options.ignore_jobs {
            reporter.report(&DeployEvent::CategorySkipped {
                category: DeployCategory::Jobs,
            });
        } else {
            self.transition(SessionState::DeployingJobs, reporter);
            let report = self.deploy_jobs(&mut transport, deadline, reporter).await?;
            summary.jobs = Some(report);
            reporter.report(&DeployEvent::CategoryCompleted {
                category: DeployCategory::Jobs,
            });
        }

        Ok(summary)
    }

    async fn register_project(
        &self,
        transport: &mut C::Transport,
        deadline: Instant,
    ) -> Result<(), DeployError> {
        let project = ProjectSpec::new(self.options.project.clone(), self.project_config.clone());
        let request = RegisterProjectRequest {
            project: Some(to_project_proto(&project)),
        };

        let response = timeout_at(
            deadline,
            transport.register_project(request, remaining(deadline)),
        )
        .await
        .map_err(|_| DeployError::Timeout {
            operation: OP_REGISTER,
        })?
        .map_err(|status| DeployError::from_status(OP_REGISTER, status))?;

        if !response.success {
            return Err(DeployError::Protocol {
                operation: OP_REGISTER,
                entity: project.name,
                message: response.message,
            });
        }
        info!("Registered project '{}'", project.name);
        Ok(())
    }

    async fn deploy_resources(
        &self,
        transport: &mut C::Transport,
        source: &ResourceSource,
        deadline: Instant,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<CategoryReport, DeployError> {
        let datastore = self
            .datastores
            .get_by_name(&source.datastore)
            .ok_or_else(|| DeployError::UnsupportedDatastore(source.datastore.clone()))?;

        let repository = (source.open)(Arc::clone(&datastore));
        let specs = repository
            .get_all()
            .map_err(|source| DeployError::Repository {
                operation: OP_RESOURCES,
                source,
            })?;

        // the batch is only sent when every spec adapts
        let mut resources = Vec::with_capacity(specs.len());
        for spec in &specs {
            let proto = to_resource_proto(spec).map_err(|source| DeployError::Spec {
                operation: OP_RESOURCES,
                entity: spec.name.clone(),
                source,
            })?;
            resources.push(proto);
        }

        let total = resources.len();
        let request = DeployResourceSpecificationRequest {
            project_name: self.options.project.clone(),
            datastore_name: datastore.name().to_string(),
            resources,
        };
        reporter.report(&DeployEvent::BatchSent {
            category: DeployCategory::Resources,
            target: datastore.name().to_string(),
            total,
        });
        debug!(
            "Sending {} resource(s) for datastore '{}'",
            total,
            datastore.name()
        );

        let mut stream = timeout_at(
            deadline,
            transport.deploy_resources(request, remaining(deadline)),
        )
        .await
        .map_err(|_| DeployError::Timeout {
            operation: OP_RESOURCES,
        })?
        .map_err(|status| DeployError::from_status(OP_RESOURCES, status))?;

        consume_acks(
            &mut stream,
            DeployCategory::Resources,
            datastore.name(),
            total,
            deadline,
            OP_RESOURCES,
            reporter,
        )
        .await
    }

    async fn deploy_jobs(
        &self,
        transport: &mut C::Transport,
        deadline: Instant,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<CategoryReport, DeployError> {
        let specs = self
            .jobs
            .get_all()
            .map_err(|source| DeployError::Repository {
                operation: OP_JOBS,
                source,
            })?;

        let mut jobs = Vec::with_capacity(specs.len());
        for spec in &specs {
            let proto = to_job_proto(spec).map_err(|source| DeployError::Spec {
                operation: OP_JOBS,
                entity: spec.name.clone(),
                source,
            })?;
            jobs.push(proto);
        }

        let total = jobs.len();
        let request = DeployJobSpecificationRequest {
            project_name: self.options.project.clone(),
            jobs,
        };
        reporter.report(&DeployEvent::BatchSent {
            category: DeployCategory::Jobs,
            target: self.options.project.clone(),
            total,
        });
        debug!("Sending {} job(s)", total);

        let mut stream = timeout_at(
            deadline,
            transport.deploy_jobs(request, remaining(deadline)),
        )
        .await
        .map_err(|_| DeployError::Timeout { operation: OP_JOBS })?
        .map_err(|status| DeployError::from_status(OP_JOBS, status))?;

        consume_acks(
            &mut stream,
            DeployCategory::Jobs,
            &self.options.project,
            total,
            deadline,
            OP_JOBS,
            reporter,
        )
        .await
    }
}

/// Time left before `deadline`, sent along with each call
fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Read an acknowledgment stream until it ends or an item fails
async fn consume_acks<R: DeployAck>(
    stream: &mut AckStream<R>,
    category: DeployCategory,
    target: &str,
    total: usize,
    deadline: Instant,
    operation: &'static str,
    reporter: &mut dyn ProgressReporter,
) -> Result<CategoryReport, DeployError> {
    let mut acknowledged = 0;

    loop {
        let next = timeout_at(deadline, stream.next())
            .await
            .map_err(|_| DeployError::Timeout { operation })?;
        let Some(message) = next else {
            break;
        };
        let response = message.map_err(|status| DeployError::from_status(operation, status))?;

        if response.is_ack() {
            if !response.is_success() {
                return Err(DeployError::Protocol {
                    operation,
                    entity: response.entity_name().to_string(),
                    message: response.message().to_string(),
                });
            }
            acknowledged += 1;
            reporter.report(&DeployEvent::ItemDeployed {
                category,
                name: response.entity_name().to_string(),
                acknowledged,
                total,
            });
        } else {
            reporter.report(&DeployEvent::Progress {
                category,
                name: response.entity_name().to_string(),
                message: response.message().to_string(),
            });
        }
    }

    if acknowledged < total {
        warn!(
            "{} stream for '{}' ended after {}/{} acknowledgment(s)",
            category, target, acknowledged, total
        );
    }

    Ok(CategoryReport {
        category,
        target: target.to_string(),
        acknowledged,
        total,
    })
}
