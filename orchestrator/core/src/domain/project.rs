// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project registration sent ahead of any deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    /// Global configuration shared by every job of the project
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl ProjectSpec {
    pub fn new(name: impl Into<String>, config: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}
