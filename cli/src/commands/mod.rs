// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the tributary CLI

pub mod config;
pub mod create;
pub mod deploy;

pub use self::config::ConfigCommand;
pub use self::create::CreateCommand;
pub use self::deploy::DeployArgs;
