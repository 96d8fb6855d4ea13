// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

// This file includes the generated protobuf code from tonic/prost

pub mod tributary {
    pub mod runtime {
        pub mod v1 {
            tonic::include_proto!("tributary.runtime.v1");
        }
    }
}

pub use tributary::runtime::v1::*;
