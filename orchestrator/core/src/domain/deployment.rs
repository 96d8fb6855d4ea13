// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Deployment Domain
//!
//! Value objects describing a deployment session: its lifecycle state, the
//! progress events it emits, and the summary it returns.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle → Connecting → RegisteringProject → DeployingResources → DeployingJobs → Completed
//!                            │                    │                   │
//!                            └──────────────→ Failed ←────────────────┘
//! ```
//!
//! `Failed` is terminal; a failed session is never resumed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Dial timeout used when none is configured
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Overall deployment deadline used when none is configured
pub const DEFAULT_DEPLOY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Connecting,
    RegisteringProject,
    DeployingResources,
    DeployingJobs,
    Completed,
    Failed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal lifecycle step
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle, Connecting) => true,
            (Connecting, RegisteringProject) => true,
            (RegisteringProject, DeployingResources | DeployingJobs | Completed) => true,
            (DeployingResources, DeployingJobs | Completed) => true,
            (DeployingJobs, Completed) => true,
            (Connecting | RegisteringProject | DeployingResources | DeployingJobs, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which batch a stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeployCategory {
    Resources,
    Jobs,
}

impl fmt::Display for DeployCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resources => f.write_str("resources"),
            Self::Jobs => f.write_str("jobs"),
        }
    }
}

/// Observable milestones of a deployment, emitted in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    ProjectRegistered {
        project: String,
    },
    CategorySkipped {
        category: DeployCategory,
    },
    BatchSent {
        category: DeployCategory,
        /// Datastore name for resources, project name for jobs
        target: String,
        total: usize,
    },
    ItemDeployed {
        category: DeployCategory,
        name: String,
        acknowledged: usize,
        total: usize,
    },
    Progress {
        category: DeployCategory,
        name: String,
        message: String,
    },
    CategoryCompleted {
        category: DeployCategory,
    },
}

/// Receives deployment events; implementations decide how to surface them
pub trait ProgressReporter: Send {
    fn report(&mut self, event: &DeployEvent);
}

/// Reporter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&mut self, _event: &DeployEvent) {}
}

/// Reporter that keeps every event, mostly useful in tests and for summaries
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub events: Vec<DeployEvent>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&mut self, event: &DeployEvent) {
        self.events.push(event.clone());
    }
}

/// Knobs for a single deployment invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub project: String,
    pub ignore_jobs: bool,
    pub ignore_resources: bool,
    pub dial_timeout: Duration,
    pub deploy_timeout: Duration,
}

impl DeployOptions {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ignore_jobs: false,
            ignore_resources: false,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            deploy_timeout: DEFAULT_DEPLOY_TIMEOUT,
        }
    }
}

/// Acknowledgment tally for one batched request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: DeployCategory,
    pub target: String,
    pub acknowledged: usize,
    pub total: usize,
}

impl CategoryReport {
    /// Fewer acks than items means the stream ended early; the remote side
    /// did not report on every item.
    pub fn is_complete(&self) -> bool {
        self.acknowledged == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub project: String,
    /// One report per datastore, in deployment order
    pub resources: Vec<CategoryReport>,
    /// `None` when job deployment was skipped
    pub jobs: Option<CategoryReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        use SessionState::*;
        assert!(Idle.can_transition_to(Connecting));
        assert!(RegisteringProject.can_transition_to(DeployingJobs));
        assert!(DeployingResources.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Failed));
        assert!(!DeployingJobs.can_transition_to(DeployingResources));
        assert!(!Completed.can_transition_to(Failed));
    }
}
