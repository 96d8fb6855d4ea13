// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

pub mod create_job;
pub mod create_resource;
pub mod deploy;

// Re-export use cases for convenience
pub use create_job::{add_hook, create_job, CreateError, JobTemplate, UserAnswer, WindowPreset};
pub use create_resource::{create_resource, ResourceTemplate};
pub use deploy::{DeployError, DeploymentSession, ResourceSource};
