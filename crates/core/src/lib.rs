// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wr-core: Core data model for the Wraith pipeline runtime

pub mod device;
pub mod envelope;
pub mod manifest;
pub mod pipeline;
pub mod time_fmt;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use device::{Device, DEVICE_FIRMWARE};
pub use envelope::Envelope;
pub use manifest::{ManifestError, ModuleManifest, PortSpec, Requirement, RuntimeSpec};
pub use pipeline::{
    ExecutionSettings, OutputSpec, Pipeline, PipelineModule, RunMode, SourceRef,
};
pub use time_fmt::{format_elapsed, parse_duration};
pub use value::{TypeName, TypeShape, Value};
