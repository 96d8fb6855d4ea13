// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Orchestrator Runtime gRPC Client
//!
//! Connection management and the transport seam used by the deployment
//! session.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** gRPC communication with the orchestrator runtime service
//! - **Integration:** Deployment Session → `RuntimeService` gRPC API
//!
//! The session talks to a [`RuntimeTransport`] rather than the generated
//! client, so the streaming protocol can be driven by in-memory fakes in
//! tests. [`GrpcConnector`] is the production [`RuntimeConnector`]: it dials
//! the configured host within the dial timeout and hands back the generated
//! [`RuntimeServiceClient`].

use crate::infrastructure::runtime_proto::runtime_service_client::RuntimeServiceClient;
use crate::infrastructure::runtime_proto::{
    DeployJobSpecificationRequest, DeployJobSpecificationResponse,
    DeployResourceSpecificationRequest, DeployResourceSpecificationResponse,
    RegisterProjectRequest, RegisterProjectResponse,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::debug;

/// Server-streamed acknowledgments for one batched request
pub type AckStream<T> = BoxStream<'static, Result<T, Status>>;

/// The three calls a deployment makes against the orchestrator
///
/// `timeout` is the time left until the deployment deadline. Implementations
/// attach it to the call so the orchestrator sees the same deadline.
#[async_trait]
pub trait RuntimeTransport: Send {
    async fn register_project(
        &mut self,
        request: RegisterProjectRequest,
        timeout: Duration,
    ) -> Result<RegisterProjectResponse, Status>;

    async fn deploy_resources(
        &mut self,
        request: DeployResourceSpecificationRequest,
        timeout: Duration,
    ) -> Result<AckStream<DeployResourceSpecificationResponse>, Status>;

    async fn deploy_jobs(
        &mut self,
        request: DeployJobSpecificationRequest,
        timeout: Duration,
    ) -> Result<AckStream<DeployJobSpecificationResponse>, Status>;
}

fn with_deadline<T>(message: T, timeout: Duration) -> Request<T> {
    let mut request = Request::new(message);
    request.set_timeout(timeout);
    request
}

#[async_trait]
impl RuntimeTransport for RuntimeServiceClient<Channel> {
    async fn register_project(
        &mut self,
        request: RegisterProjectRequest,
        timeout: Duration,
    ) -> Result<RegisterProjectResponse, Status> {
        let response =
            RuntimeServiceClient::register_project(self, with_deadline(request, timeout)).await?;
        Ok(response.into_inner())
    }

    async fn deploy_resources(
        &mut self,
        request: DeployResourceSpecificationRequest,
        timeout: Duration,
    ) -> Result<AckStream<DeployResourceSpecificationResponse>, Status> {
        let response = self
            .deploy_resource_specification(with_deadline(request, timeout))
            .await?;
        Ok(response.into_inner().boxed())
    }

    async fn deploy_jobs(
        &mut self,
        request: DeployJobSpecificationRequest,
        timeout: Duration,
    ) -> Result<AckStream<DeployJobSpecificationResponse>, Status> {
        let response = self
            .deploy_job_specification(with_deadline(request, timeout))
            .await?;
        Ok(response.into_inner().boxed())
    }
}

/// A streamed message that is either a per-item ack or a progress note
pub trait DeployAck {
    fn is_ack(&self) -> bool;
    fn is_success(&self) -> bool;
    fn entity_name(&self) -> &str;
    fn message(&self) -> &str;
}

impl DeployAck for DeployResourceSpecificationResponse {
    fn is_ack(&self) -> bool {
        self.ack
    }

    fn is_success(&self) -> bool {
        self.success
    }

    fn entity_name(&self) -> &str {
        &self.resource_name
    }

    fn message(&self) -> &str {
        &self.message
    }
}

impl DeployAck for DeployJobSpecificationResponse {
    fn is_ack(&self) -> bool {
        self.ack
    }

    fn is_success(&self) -> bool {
        self.success
    }

    fn entity_name(&self) -> &str {
        &self.job_name
    }

    fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid orchestrator address '{host}': {message}")]
    InvalidEndpoint { host: String, message: String },

    #[error("can't reach orchestrator at {host} within {timeout:?}")]
    TimedOut { host: String, timeout: Duration },

    #[error("failed to connect to orchestrator at {host}: {message}")]
    Failed { host: String, message: String },
}

/// Establishes a transport within a dial timeout
#[async_trait]
pub trait RuntimeConnector: Send + Sync {
    type Transport: RuntimeTransport;

    /// Address reported in progress output and errors
    fn host(&self) -> &str;

    async fn connect(&self, dial_timeout: Duration) -> Result<Self::Transport, ConnectError>;
}

/// Plaintext gRPC connector for `host:port` or `http(s)://host:port`
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    host: String,
}

impl GrpcConnector {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn uri(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.clone()
        } else {
            format!("http://{}", self.host)
        }
    }
}

#[async_trait]
impl RuntimeConnector for GrpcConnector {
    type Transport = RuntimeServiceClient<Channel>;

    fn host(&self) -> &str {
        &self.host
    }

    async fn connect(&self, dial_timeout: Duration) -> Result<Self::Transport, ConnectError> {
        let endpoint =
            Endpoint::from_shared(self.uri()).map_err(|e| ConnectError::InvalidEndpoint {
                host: self.host.clone(),
                message: e.to_string(),
            })?;

        debug!("Dialing orchestrator at {} (timeout {:?})", self.host, dial_timeout);
        let channel = dial_within(&self.host, dial_timeout, endpoint.connect()).await?;
        Ok(RuntimeServiceClient::new(channel))
    }
}

/// Await a dial, reporting the dial timeout as [`ConnectError::TimedOut`]
///
/// The dial must not carry a connect timeout of its own, otherwise the two
/// timers race and an expired dial can surface as a plain failure.
async fn dial_within<T, E, F>(
    host: &str,
    dial_timeout: Duration,
    dial: F,
) -> Result<T, ConnectError>
where
    F: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    match tokio::time::timeout(dial_timeout, dial).await {
        Ok(Ok(connected)) => Ok(connected),
        Ok(Err(e)) => Err(ConnectError::Failed {
            host: host.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(ConnectError::TimedOut {
            host: host.to_string(),
            timeout: dial_timeout,
        }),
    }
}
