// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Local Specification Storage
//!
//! File-system repositories for job and resource specifications.
//!
//! # Layout
//!
//! ```text
//! jobs/
//! ├── orders-daily/
//! │   ├── job.yaml
//! │   └── assets/
//! │       └── query.sql
//! └── sales/customers/
//!     └── job.yaml
//! bigquery/
//! └── warehouse/orders/
//!     ├── resource.yaml
//!     └── schema.json
//! ```
//!
//! Any directory holding a `job.yaml` is a job; files below its `assets/`
//! directory become job assets keyed by their path relative to `assets/`.
//! Any directory holding a `resource.yaml` is a resource; sibling files
//! become resource assets. A missing root is an empty repository.

use crate::domain::job::JobSpec;
use crate::domain::repository::{JobSpecRepository, RepositoryError, ResourceSpecRepository};
use crate::domain::resource::{Datastore, ResourceSpec};
use crate::infrastructure::job_spec_adapter::{Job, JobSpecAdapter};
use crate::infrastructure::resource_spec_adapter::{Resource, ResourceSpecAdapter};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

pub const JOB_SPEC_FILE: &str = "job.yaml";
pub const JOB_ASSET_DIR: &str = "assets";
pub const RESOURCE_SPEC_FILE: &str = "resource.yaml";

/// Directories under `root` that contain `file_name`, in file-name order
fn spec_dirs(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, RepositoryError> {
    if !root.exists() {
        debug!("Spec root {:?} does not exist, nothing to load", root);
        return Ok(vec![]);
    }

    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == JOB_ASSET_DIR));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RepositoryError::io(&path, e)
        })?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            if let Some(parent) = entry.path().parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    Ok(dirs)
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RepositoryError> {
    let content = fs::read_to_string(path).map_err(|e| RepositoryError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| RepositoryError::yaml(path, e))
}

fn relative_key(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

// ============================================================================
// Jobs
// ============================================================================

pub struct LocalJobSpecRepository {
    root: PathBuf,
    adapter: JobSpecAdapter,
}

impl LocalJobSpecRepository {
    pub fn new(root: impl Into<PathBuf>, adapter: JobSpecAdapter) -> Self {
        Self {
            root: root.into(),
            adapter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn adapter(&self) -> &JobSpecAdapter {
        &self.adapter
    }

    /// Read `job.yaml` and merge the `assets/` files, without adapting
    fn read_job(&self, dir: &Path) -> Result<Job, RepositoryError> {
        let mut job: Job = read_yaml(&dir.join(JOB_SPEC_FILE))?;

        let asset_dir = dir.join(JOB_ASSET_DIR);
        if asset_dir.is_dir() {
            for entry in WalkDir::new(&asset_dir).sort_by_file_name() {
                let entry = entry.map_err(|e| RepositoryError::io(&asset_dir, e))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let content =
                    fs::read_to_string(entry.path()).map_err(|e| RepositoryError::io(entry.path(), e))?;
                if let Some(key) = relative_key(entry.path(), &asset_dir) {
                    job.asset.insert(key, content);
                }
            }
        }
        Ok(job)
    }

    fn adapt(&self, dir: &Path, job: &Job) -> Result<JobSpec, RepositoryError> {
        self.adapter
            .to_spec(job)
            .map_err(|source| RepositoryError::Spec {
                path: dir.join(JOB_SPEC_FILE).display().to_string(),
                source,
            })
    }

    /// Directory a job named `name` was loaded from, if any
    fn find_dir(&self, name: &str) -> Result<Option<PathBuf>, RepositoryError> {
        for dir in spec_dirs(&self.root, JOB_SPEC_FILE)? {
            let job: Job = read_yaml(&dir.join(JOB_SPEC_FILE))?;
            if job.name.trim() == name {
                return Ok(Some(dir));
            }
        }
        Ok(None)
    }
}

impl JobSpecRepository for LocalJobSpecRepository {
    fn get_all(&self) -> Result<Vec<JobSpec>, RepositoryError> {
        let mut specs = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for dir in spec_dirs(&self.root, JOB_SPEC_FILE)? {
            let job = self.read_job(&dir)?;
            let spec = self.adapt(&dir, &job)?;
            if let Some(first) = seen.get(&spec.name) {
                return Err(RepositoryError::Duplicate {
                    name: spec.name,
                    first: first.display().to_string(),
                    second: dir.display().to_string(),
                });
            }
            seen.insert(spec.name.clone(), dir);
            specs.push(spec);
        }

        debug!("Loaded {} job spec(s) from {:?}", specs.len(), self.root);
        Ok(specs)
    }

    fn get_by_name(&self, name: &str) -> Result<JobSpec, RepositoryError> {
        let dir = self
            .find_dir(name)?
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        let job = self.read_job(&dir)?;
        self.adapt(&dir, &job)
    }

    fn save(&self, spec: &JobSpec) -> Result<(), RepositoryError> {
        let dir = match self.find_dir(&spec.name)? {
            Some(dir) => dir,
            None => self.root.join(&spec.name),
        };
        self.save_at(spec, &dir)
    }

    fn save_at(&self, spec: &JobSpec, dir: &Path) -> Result<(), RepositoryError> {
        let mut job = self
            .adapter
            .from_spec(spec)
            .map_err(|source| RepositoryError::Spec {
                path: dir.display().to_string(),
                source,
            })?;
        let assets = std::mem::take(&mut job.asset);

        fs::create_dir_all(dir).map_err(|e| RepositoryError::io(dir, e))?;
        let path = dir.join(JOB_SPEC_FILE);
        let yaml = serde_yaml::to_string(&job).map_err(|e| RepositoryError::yaml(&path, e))?;
        fs::write(&path, yaml).map_err(|e| RepositoryError::io(&path, e))?;

        for (name, content) in assets {
            let asset_path = dir.join(JOB_ASSET_DIR).join(&name);
            if let Some(parent) = asset_path.parent() {
                fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
            }
            fs::write(&asset_path, content).map_err(|e| RepositoryError::io(&asset_path, e))?;
        }

        debug!("Saved job '{}' to {:?}", spec.name, dir);
        Ok(())
    }
}

// ============================================================================
// Resources
// ============================================================================

pub struct LocalResourceSpecRepository {
    root: PathBuf,
    datastore: Arc<Datastore>,
    adapter: ResourceSpecAdapter,
}

impl LocalResourceSpecRepository {
    pub fn new(root: impl Into<PathBuf>, datastore: Arc<Datastore>) -> Self {
        Self {
            root: root.into(),
            datastore,
            adapter: ResourceSpecAdapter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, dir: &Path) -> Result<ResourceSpec, RepositoryError> {
        let path = dir.join(RESOURCE_SPEC_FILE);
        let resource: Resource = read_yaml(&path)?;

        let mut assets = BTreeMap::new();
        let entries = fs::read_dir(dir).map_err(|e| RepositoryError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RepositoryError::io(dir, e))?;
            let file_type = entry.file_type().map_err(|e| RepositoryError::io(&entry.path(), e))?;
            if !file_type.is_file() || entry.file_name() == RESOURCE_SPEC_FILE {
                continue;
            }
            let content =
                fs::read_to_string(entry.path()).map_err(|e| RepositoryError::io(&entry.path(), e))?;
            assets.insert(entry.file_name().to_string_lossy().into_owned(), content);
        }

        self.adapter
            .to_spec(&resource, &self.datastore, assets)
            .map_err(|source| RepositoryError::Spec {
                path: path.display().to_string(),
                source,
            })
    }
}

impl ResourceSpecRepository for LocalResourceSpecRepository {
    fn get_all(&self) -> Result<Vec<ResourceSpec>, RepositoryError> {
        let mut specs = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for dir in spec_dirs(&self.root, RESOURCE_SPEC_FILE)? {
            let spec = self.load(&dir)?;
            if let Some(first) = seen.get(&spec.name) {
                return Err(RepositoryError::Duplicate {
                    name: spec.name,
                    first: first.display().to_string(),
                    second: dir.display().to_string(),
                });
            }
            seen.insert(spec.name.clone(), dir);
            specs.push(spec);
        }

        debug!(
            "Loaded {} resource spec(s) for datastore '{}' from {:?}",
            specs.len(),
            self.datastore.name(),
            self.root
        );
        Ok(specs)
    }

    fn get_by_name(&self, name: &str) -> Result<ResourceSpec, RepositoryError> {
        for dir in spec_dirs(&self.root, RESOURCE_SPEC_FILE)? {
            let resource: Resource = read_yaml(&dir.join(RESOURCE_SPEC_FILE))?;
            if resource.name.trim() == name {
                return self.load(&dir);
            }
        }
        Err(RepositoryError::NotFound(name.to_string()))
    }

    fn save_at(&self, spec: &ResourceSpec, dir: &Path) -> Result<(), RepositoryError> {
        let path = dir.join(RESOURCE_SPEC_FILE);
        self.adapter
            .check_type(&spec.resource_type, &self.datastore)
            .map_err(|source| RepositoryError::Spec {
                path: path.display().to_string(),
                source,
            })?;

        fs::create_dir_all(dir).map_err(|e| RepositoryError::io(dir, e))?;
        let resource = self.adapter.from_spec(spec);
        let yaml = serde_yaml::to_string(&resource).map_err(|e| RepositoryError::yaml(&path, e))?;
        fs::write(&path, yaml).map_err(|e| RepositoryError::io(&path, e))?;

        for (name, content) in &spec.assets {
            let asset_path = dir.join(name);
            fs::write(&asset_path, content).map_err(|e| RepositoryError::io(&asset_path, e))?;
        }

        debug!(
            "Saved resource '{}' for datastore '{}' to {:?}",
            spec.name,
            self.datastore.name(),
            dir
        );
        Ok(())
    }
}
