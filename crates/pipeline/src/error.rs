// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline loading and validation errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read pipeline: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("module entry #{index} has no 'module' or 'name' field")]
    MissingModuleName { index: usize },

    #[error("module id '{0}' is defined more than once")]
    DuplicateModuleId(String),

    #[error("module '{module}' depends on unknown id '{dependency}'")]
    UnknownDependency { module: String, dependency: String },

    #[error("module '{module}' maps input '{input}' from unknown id '{source_id}'")]
    UnknownSource {
        module: String,
        input: String,
        source_id: String,
    },

    #[error("dependency cycle: {0}")]
    DependencyCycle(String),
}
