// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! Tributary CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command handlers and the project context they share

pub mod commands;
pub mod context;
