// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! # Specification Errors
//!
//! Errors raised while validating or adapting a specification. All of them
//! surface before any network activity and none are retried.
//!
//! | Variant | [`ErrorKind`] |
//! |---------|---------------|
//! | `Validation` | `Validation` |
//! | `Parse` | `Parse` |
//! | `Resolution` | `Resolution` |
//! | `MissingTaskUnit`, `Serialization` | `Validation` |

use std::fmt;
use thiserror::Error;

/// User-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Parse,
    Resolution,
    Transport,
    ProtocolFailure,
    Timeout,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Parse => "parse",
            Self::Resolution => "resolution",
            Self::Transport => "transport",
            Self::ProtocolFailure => "protocol failure",
            Self::Timeout => "timeout",
            Self::Storage => "storage",
        };
        f.write_str(label)
    }
}

/// What an unresolved name was supposed to reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTarget {
    Task,
    Hook,
    ResourceType,
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => f.write_str("task"),
            Self::Hook => f.write_str("hook"),
            Self::ResourceType => f.write_str("resource type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("invalid field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to parse {field} '{value}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("spec reading error, failed to find {target} '{name}'")]
    Resolution {
        target: ResolutionTarget,
        name: String,
    },

    #[error("task unit is missing, job cannot be written back")]
    MissingTaskUnit,

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SpecError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(field: impl Into<String>, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::MissingTaskUnit | Self::Serialization(_) => {
                ErrorKind::Validation
            }
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Resolution { .. } => ErrorKind::Resolution,
        }
    }
}
