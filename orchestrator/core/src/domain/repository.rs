// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Specification Repository Interfaces
//!
//! Storage contracts for job and resource specifications. The deployment
//! session only needs `get_all`; authoring commands also look up single
//! specs by name and write new ones.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `JobSpecRepository` | `JobSpec` | `LocalJobSpecRepository` |
//! | `ResourceSpecRepository` | `ResourceSpec` | `LocalResourceSpecRepository` |

use crate::domain::job::JobSpec;
use crate::domain::resource::ResourceSpec;
use crate::domain::spec_error::SpecError;
use std::path::Path;
use thiserror::Error;

pub trait JobSpecRepository: Send + Sync {
    /// Load every job specification
    fn get_all(&self) -> Result<Vec<JobSpec>, RepositoryError>;

    fn get_by_name(&self, name: &str) -> Result<JobSpec, RepositoryError>;

    /// Persist a job where it was loaded from (or under its name for new jobs)
    fn save(&self, spec: &JobSpec) -> Result<(), RepositoryError>;

    /// Persist a job into an explicit directory
    fn save_at(&self, spec: &JobSpec, dir: &Path) -> Result<(), RepositoryError>;
}

pub trait ResourceSpecRepository: Send + Sync {
    fn get_all(&self) -> Result<Vec<ResourceSpec>, RepositoryError>;

    fn get_by_name(&self, name: &str) -> Result<ResourceSpec, RepositoryError>;

    /// Persist a resource and its assets into an explicit directory
    fn save_at(&self, spec: &ResourceSpec, dir: &Path) -> Result<(), RepositoryError>;
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error at {path}: {error}")]
    Io { path: String, error: String },

    #[error("YAML error in {path}: {error}")]
    Yaml { path: String, error: String },

    #[error("invalid specification in {path}: {source}")]
    Spec {
        path: String,
        #[source]
        source: SpecError,
    },

    #[error("no such spec: {0}")]
    NotFound(String),

    #[error("spec '{name}' is defined twice: {first} and {second}")]
    Duplicate {
        name: String,
        first: String,
        second: String,
    },
}

impl RepositoryError {
    pub fn io(path: &Path, error: impl ToString) -> Self {
        Self::Io {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    pub fn yaml(path: &Path, error: impl ToString) -> Self {
        Self::Yaml {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
