// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Drives a deployment against an in-process orchestrator over real gRPC.

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tributary_core::application::deploy::{DeployError, DeploymentSession, ResourceSource};
use tributary_core::domain::deployment::{DeployOptions, RecordingReporter};
use tributary_core::domain::plugin::HookKind;
use tributary_core::domain::repository::ResourceSpecRepository;
use tributary_core::domain::resource::{Datastore, ResourceType};
use tributary_core::domain::spec_error::ErrorKind;
use tributary_core::infrastructure::proto_adapter::struct_to_json;
use tributary_core::infrastructure::registry::{
    DatastoreRegistry, DeclaredHookPlugin, DeclaredTaskPlugin, PluginRegistry,
};
use tributary_core::infrastructure::runtime_proto::runtime_service_server::{
    RuntimeService, RuntimeServiceServer,
};
use tributary_core::infrastructure::runtime_proto::{
    DeployJobSpecificationRequest, DeployJobSpecificationResponse,
    DeployResourceSpecificationRequest, DeployResourceSpecificationResponse,
    RegisterProjectRequest, RegisterProjectResponse,
};
use tributary_core::infrastructure::spec_validation::SpecValidator;
use tributary_core::infrastructure::{
    GrpcConnector, JobSpecAdapter, LocalJobSpecRepository, LocalResourceSpecRepository,
};

#[derive(Debug, Default)]
struct Received {
    projects: Vec<RegisterProjectRequest>,
    resources: Vec<DeployResourceSpecificationRequest>,
    jobs: Vec<DeployJobSpecificationRequest>,
    grpc_timeouts: Vec<Option<String>>,
}

fn grpc_timeout<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get("grpc-timeout")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Clone, Default)]
struct FakeOrchestrator {
    received: Arc<Mutex<Received>>,
    reject_job: Option<String>,
}

#[tonic::async_trait]
impl RuntimeService for FakeOrchestrator {
    async fn register_project(
        &self,
        request: Request<RegisterProjectRequest>,
    ) -> Result<Response<RegisterProjectResponse>, Status> {
        let mut received = self.received.lock().unwrap();
        received.grpc_timeouts.push(grpc_timeout(&request));
        received.projects.push(request.into_inner());
        drop(received);
        Ok(Response::new(RegisterProjectResponse {
            success: true,
            message: String::new(),
        }))
    }

    type DeployJobSpecificationStream =
        ReceiverStream<Result<DeployJobSpecificationResponse, Status>>;

    async fn deploy_job_specification(
        &self,
        request: Request<DeployJobSpecificationRequest>,
    ) -> Result<Response<Self::DeployJobSpecificationStream>, Status> {
        let timeout = grpc_timeout(&request);
        let request = request.into_inner();
        let names: Vec<String> = request.jobs.iter().map(|j| j.name.clone()).collect();
        let mut received = self.received.lock().unwrap();
        received.grpc_timeouts.push(timeout);
        received.jobs.push(request);
        drop(received);

        let reject = self.reject_job.clone();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for name in names {
                let _ = tx
                    .send(Ok(DeployJobSpecificationResponse {
                        success: false,
                        ack: false,
                        message: "compiling".to_string(),
                        job_name: name.clone(),
                    }))
                    .await;
                let rejected = reject.as_deref() == Some(name.as_str());
                let _ = tx
                    .send(Ok(DeployJobSpecificationResponse {
                        success: !rejected,
                        ack: true,
                        message: if rejected {
                            "task config invalid".to_string()
                        } else {
                            String::new()
                        },
                        job_name: name,
                    }))
                    .await;
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }

    type DeployResourceSpecificationStream =
        ReceiverStream<Result<DeployResourceSpecificationResponse, Status>>;

    async fn deploy_resource_specification(
        &self,
        request: Request<DeployResourceSpecificationRequest>,
    ) -> Result<Response<Self::DeployResourceSpecificationStream>, Status> {
        let timeout = grpc_timeout(&request);
        let request = request.into_inner();
        let names: Vec<String> = request.resources.iter().map(|r| r.name.clone()).collect();
        let mut received = self.received.lock().unwrap();
        received.grpc_timeouts.push(timeout);
        received.resources.push(request);
        drop(received);

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for name in names {
                let _ = tx
                    .send(Ok(DeployResourceSpecificationResponse {
                        success: true,
                        ack: true,
                        message: String::new(),
                        resource_name: name,
                    }))
                    .await;
            }
        });
        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

async fn serve(orchestrator: FakeOrchestrator) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(
        Server::builder()
            .add_service(RuntimeServiceServer::new(orchestrator))
            .serve_with_incoming(TcpListenerStream::new(listener)),
    );
    addr
}

fn write_job(root: &Path, name: &str, window_size: &str) {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("assets")).unwrap();
    fs::write(
        dir.join("job.yaml"),
        format!(
            r#"version: 1
name: {name}
owner: data-eng
schedule:
  start_date: "2021-02-18"
  interval: "0 2 * * *"
behavior:
  catch_up: true
task:
  name: bq2bq
  config:
    PROJECT: warehouse
    DATASET: sales
  window:
    size: {window_size}
    offset: "0"
    truncate_to: d
dependencies:
  - job: upstream-{name}
    type: inter
hooks:
  - name: transporter
    config:
      BROKER: kafka:9092
"#
        ),
    )
    .unwrap();
    fs::write(dir.join("assets/query.sql"), format!("select * from {name}")).unwrap();
}

fn write_resource(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("resource.yaml"),
        format!(
            "version: 1\nname: {name}\ntype: table\nlabels:\n  team: sales\nspec:\n  description: {name}\n  partition_hours: 24\n"
        ),
    )
    .unwrap();
}

fn job_repository(root: &Path) -> Arc<LocalJobSpecRepository> {
    let mut registry = PluginRegistry::new();
    registry
        .register_task(Arc::new(DeclaredTaskPlugin::new("bq2bq", "BigQuery to BigQuery")))
        .unwrap();
    registry
        .register_hook(Arc::new(DeclaredHookPlugin::new(
            "transporter",
            "publish to kafka",
            HookKind::Post,
        )))
        .unwrap();
    let registry = Arc::new(registry);
    let adapter = JobSpecAdapter::new(
        registry.clone(),
        registry,
        Arc::new(SpecValidator::default()),
    );
    Arc::new(LocalJobSpecRepository::new(root, adapter))
}

struct Workspace {
    _tmp: TempDir,
    jobs: Arc<LocalJobSpecRepository>,
    resources_root: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let tmp = TempDir::new().unwrap();
    let jobs_root = tmp.path().join("jobs");
    write_job(&jobs_root, "orders-daily", "24h");
    write_job(&jobs_root, "orders-monthly", "1M");
    write_job(&jobs_root, "customers", "1h");

    let resources_root = tmp.path().join("datastore/bigquery");
    write_resource(&resources_root, "warehouse.orders");
    write_resource(&resources_root, "warehouse.customers");

    Workspace {
        jobs: job_repository(&jobs_root),
        resources_root,
        _tmp: tmp,
    }
}

fn session(
    addr: SocketAddr,
    workspace: &Workspace,
) -> DeploymentSession<GrpcConnector> {
    let mut options = DeployOptions::new("data-platform");
    options.dial_timeout = Duration::from_secs(5);
    options.deploy_timeout = Duration::from_secs(10);

    let root = workspace.resources_root.clone();
    DeploymentSession::new(
        GrpcConnector::new(addr.to_string()),
        options,
        workspace.jobs.clone(),
        Arc::new(DatastoreRegistry::new(vec![Datastore::new(
            "bigquery",
            vec![ResourceType::new("dataset"), ResourceType::new("table")],
        )])),
    )
    .with_project_config(BTreeMap::from([(
        "storage_path".to_string(),
        "gs://warehouse-staging".to_string(),
    )]))
    .with_resource_source(ResourceSource::new("bigquery", move |datastore| {
        Arc::new(LocalResourceSpecRepository::new(root.clone(), datastore))
            as Arc<dyn ResourceSpecRepository>
    }))
}

#[tokio::test]
async fn test_deploys_local_project_over_grpc() {
    let orchestrator = FakeOrchestrator::default();
    let received = orchestrator.received.clone();
    let addr = serve(orchestrator).await;
    let ws = workspace();

    let mut reporter = RecordingReporter::default();
    let summary = session(addr, &ws).run(&mut reporter).await.unwrap();

    assert_eq!(summary.resources.len(), 1);
    assert!(summary.resources[0].is_complete());
    assert_eq!(summary.resources[0].total, 2);
    let jobs = summary.jobs.unwrap();
    assert_eq!((jobs.acknowledged, jobs.total), (3, 3));

    let received = received.lock().unwrap();
    let project = received.projects[0].project.as_ref().unwrap();
    assert_eq!(project.name, "data-platform");
    assert_eq!(
        project.config.get("storage_path").map(String::as_str),
        Some("gs://warehouse-staging")
    );

    let batch = &received.resources[0];
    assert_eq!(batch.project_name, "data-platform");
    assert_eq!(batch.datastore_name, "bigquery");
    let orders = batch
        .resources
        .iter()
        .find(|r| r.name == "warehouse.orders")
        .unwrap();
    assert_eq!(orders.r#type, "table");
    assert_eq!(orders.labels.get("team").map(String::as_str), Some("sales"));
    assert_eq!(
        struct_to_json(orders.spec.as_ref().unwrap()),
        serde_json::json!({"description": "warehouse.orders", "partition_hours": 24})
    );

    let batch = &received.jobs[0];
    assert_eq!(batch.jobs.len(), 3);
    let monthly = batch
        .jobs
        .iter()
        .find(|j| j.name == "orders-monthly")
        .unwrap();
    assert_eq!(monthly.task_name, "bq2bq");
    assert_eq!(monthly.start_date, "2021-02-18");
    assert_eq!(monthly.end_date, "");
    assert_eq!(monthly.interval, "0 2 * * *");
    assert_eq!(monthly.window_size, "720h0m0s");
    assert_eq!(monthly.window_offset, "0s");
    assert_eq!(monthly.window_truncate_to, "d");
    assert!(monthly.catch_up);
    let config: Vec<(&str, &str)> = monthly
        .config
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();
    assert_eq!(config, vec![("PROJECT", "warehouse"), ("DATASET", "sales")]);
    assert_eq!(monthly.dependencies[0].name, "upstream-orders-monthly");
    assert_eq!(monthly.dependencies[0].r#type, "inter");
    assert_eq!(monthly.hooks[0].name, "transporter");
    assert_eq!(
        monthly.assets.get("query.sql").map(String::as_str),
        Some("select * from orders-monthly")
    );
}

#[tokio::test]
async fn test_rejected_job_over_grpc() {
    let orchestrator = FakeOrchestrator {
        reject_job: Some("orders-daily".to_string()),
        ..Default::default()
    };
    let addr = serve(orchestrator).await;
    let ws = workspace();

    let err = session(addr, &ws)
        .run(&mut RecordingReporter::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolFailure);
    assert!(matches!(
        err,
        DeployError::Protocol { ref entity, ref message, .. }
            if entity == "orders-daily" && message == "task config invalid"
    ));
}

#[tokio::test]
async fn test_unreachable_orchestrator_is_transport_error() {
    // bind then drop so the port is closed
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let ws = workspace();

    let mut options = DeployOptions::new("data-platform");
    options.dial_timeout = Duration::ZERO;
    let err = DeploymentSession::new(
        GrpcConnector::new(addr.to_string()),
        options,
        ws.jobs.clone(),
        Arc::new(DatastoreRegistry::default()),
    )
    .run(&mut RecordingReporter::default())
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_deploy_deadline_reaches_the_orchestrator() {
    let orchestrator = FakeOrchestrator::default();
    let received = orchestrator.received.clone();
    let addr = serve(orchestrator).await;
    let ws = workspace();

    session(addr, &ws)
        .run(&mut RecordingReporter::default())
        .await
        .unwrap();

    // register, one resource batch, one job batch
    let received = received.lock().unwrap();
    assert_eq!(received.grpc_timeouts.len(), 3);
    for header in &received.grpc_timeouts {
        let header = header.as_deref().expect("call without grpc-timeout");
        let (value, unit) = header.split_at(header.len() - 1);
        assert!(["H", "M", "S", "m", "u", "n"].contains(&unit), "{header}");
        assert!(value.parse::<u64>().unwrap() > 0, "{header}");
    }
}
