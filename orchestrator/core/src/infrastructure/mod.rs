// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

pub mod job_spec_adapter;
pub mod local_store;
pub mod proto_adapter;
pub mod registry;
pub mod resource_spec_adapter;
pub mod runtime_client;
pub mod runtime_proto;
pub mod spec_validation;

pub use job_spec_adapter::JobSpecAdapter;
pub use local_store::{LocalJobSpecRepository, LocalResourceSpecRepository};
pub use registry::{DatastoreRegistry, PluginRegistry};
pub use runtime_client::GrpcConnector;
