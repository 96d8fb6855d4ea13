// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Canonical job, resource and project models plus the contracts the
//! infrastructure layer implements.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits, no I/O

pub mod client_config;
pub mod deployment;
pub mod duration;
pub mod job;
pub mod plugin;
pub mod project;
pub mod repository;
pub mod resource;
pub mod spec_error;
