// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for tributary-core
//!
//! Compiles the orchestrator runtime protocol used by the deployment session.
//!
//! # Compilation Targets
//!
//! - **Runtime API**: `proto/tributary/runtime/v1/runtime.proto`
//!
//! Generated code is placed in `OUT_DIR` and included via `tonic::include_proto!`
//! in `src/infrastructure/runtime_proto.rs`. Server stubs are generated as well
//! so integration tests can stand up an in-process orchestrator.
//!
//! # Dependencies
//!
//! - **protoc**: Protocol buffer compiler (vendored via `protoc-bin-vendored`)
//! - **tonic-prost-build**: Code generator for Rust gRPC stubs

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point prost at the vendored protoc binary and its well-known type includes
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    std::env::set_var("PROTOC", protoc);
    let well_known = protoc_bin_vendored::include_path()?;

    let protos = [std::path::PathBuf::from("proto/tributary/runtime/v1/runtime.proto")];
    let includes = [
        std::path::PathBuf::from("proto"),
        well_known,
    ];

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&protos, &includes)?;

    println!("cargo:rerun-if-changed=proto/tributary/runtime/v1/runtime.proto");

    Ok(())
}
