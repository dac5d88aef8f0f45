// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline file resolution and loading.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use wr_core::Pipeline;

use crate::error::PipelineError;
use crate::normalize::{normalize_raw, RawPipeline};
use crate::validate::validate_pipeline;

pub struct PipelineLoader {
    dir: PathBuf,
}

/// Summary row for `list pipelines`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub module_count: usize,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        info!(dir = %dir.display(), "pipeline directory set");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load, normalize, and validate `<dir>/<name>.yaml`.
    pub fn load(&self, name: &str) -> Result<Pipeline, PipelineError> {
        let path = self.dir.join(format!("{}.yaml", name));
        debug!(path = %path.display(), "loading pipeline");
        if !path.is_file() {
            return Err(PipelineError::NotFound(path));
        }
        let raw = std::fs::read_to_string(&path)?;
        let pipeline = parse_pipeline(&raw)?;
        debug!(
            pipeline = %pipeline.name,
            modules = pipeline.modules.len(),
            "pipeline loaded"
        );
        Ok(pipeline)
    }

    /// Enumerate every `*.yaml` in the pipeline directory with basic
    /// information, tolerating unreadable files.
    pub fn list(&self) -> Vec<PipelineInfo> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %err, "cannot list pipeline directory");
                return vec![];
            }
        };

        let mut result = vec![];
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.clone());

            match std::fs::read_to_string(&path)
                .map_err(PipelineError::from)
                .and_then(|raw| parse_pipeline(&raw))
            {
                Ok(pipeline) => result.push(PipelineInfo {
                    display_name: pipeline.name.clone(),
                    description: pipeline.description.clone().unwrap_or_default(),
                    module_count: pipeline.modules.len(),
                    name,
                    filename,
                    error: None,
                }),
                Err(err) => {
                    warn!(pipeline = %name, error = %err, "error reading pipeline");
                    result.push(PipelineInfo {
                        display_name: name.clone(),
                        description: "error loading pipeline".to_string(),
                        module_count: 0,
                        name,
                        filename,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

/// Parse a pipeline document: unwrap an optional top-level `pipeline:` key,
/// normalize the short form, and validate the result.
pub fn parse_pipeline(yaml: &str) -> Result<Pipeline, PipelineError> {
    let mut document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if let serde_yaml::Value::Mapping(mapping) = &mut document {
        let key = serde_yaml::Value::String("pipeline".to_string());
        if let Some(inner) = mapping.remove(&key) {
            debug!("pipeline wrapped under 'pipeline:' key, unwrapping");
            document = inner;
        }
    }
    let raw: RawPipeline = serde_yaml::from_value(document)?;
    let pipeline = normalize_raw(raw)?;
    validate_pipeline(&pipeline)?;
    Ok(pipeline)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
