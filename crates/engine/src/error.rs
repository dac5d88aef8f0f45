// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine start-up errors. Anything here refuses the run; steady-state
//! failures are contained per module instead.

use thiserror::Error;

use crate::wiring::WireError;
use wr_pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("failed to wire modules: {0}")]
    Wire(#[from] WireError),

    #[error("failed to write output report: {0}")]
    Report(#[source] std::io::Error),
}
