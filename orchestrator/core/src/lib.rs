// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! Tributary Core
//!
//! Client-side boundary of the Tributary orchestrator: adapts on-disk job and
//! resource specifications into the canonical domain model and synchronizes
//! them with a remote orchestrator over gRPC.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Spec adaptation and deployment protocol

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
