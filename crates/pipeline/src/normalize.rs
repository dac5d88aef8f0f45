// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-form to canonical-form normalization.
//!
//! The short form lets operators write `module:` instead of `name:`, an
//! `input:` map of `input_name: source_ref` strings, and `outputs:` as bare
//! strings or `{output: mapped}` pairs. Normalization is a fixed point:
//! feeding a canonical pipeline back through produces the same pipeline.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use wr_core::{
    ExecutionSettings, OutputSpec, Pipeline, PipelineModule, RunMode, SourceRef, Value,
};

use crate::error::PipelineError;

#[derive(Debug, Deserialize)]
pub(crate) struct RawPipeline {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    execution: ExecutionSettings,
    #[serde(default)]
    modules: Vec<RawModule>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    /// Short-form registry key; copied to `name`.
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    /// Short form: `input_name: source_ref`.
    #[serde(default)]
    input: IndexMap<String, String>,
    #[serde(default)]
    input_mappings: IndexMap<String, String>,
    #[serde(default)]
    config: IndexMap<String, serde_yaml::Value>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
    #[serde(default)]
    run_mode: Option<RunMode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOutput {
    /// `- keywords`
    Name(String),
    /// `- {name: keywords, mapped: tracked}`
    Full {
        name: String,
        #[serde(default)]
        mapped: Option<String>,
    },
    /// `- keywords: tracked`
    Mapping(IndexMap<String, String>),
}

/// Normalize a parsed document into the canonical pipeline model.
pub(crate) fn normalize_raw(raw: RawPipeline) -> Result<Pipeline, PipelineError> {
    let mut modules = Vec::with_capacity(raw.modules.len());
    for (index, module) in raw.modules.into_iter().enumerate() {
        modules.push(normalize_module(module, index)?);
    }
    Ok(Pipeline {
        name: raw.name,
        description: raw.description,
        execution: raw.execution,
        modules,
    })
}

/// Re-normalize an already canonical pipeline (identity; used by tests to
/// demonstrate the fixed point).
pub fn normalize_pipeline(pipeline: Pipeline) -> Result<Pipeline, PipelineError> {
    let yaml = serde_yaml::to_string(&pipeline)?;
    let raw: RawPipeline = serde_yaml::from_str(&yaml)?;
    normalize_raw(raw)
}

fn normalize_module(raw: RawModule, index: usize) -> Result<PipelineModule, PipelineError> {
    let name = raw
        .module
        .or(raw.name)
        .ok_or(PipelineError::MissingModuleName { index })?;
    let id = raw.id.unwrap_or_else(|| name.to_lowercase());
    debug!(module = %name, id = %id, "normalized module entry");

    let mut depends_on = raw.depends_on;

    // Canonical mappings first, then the `input:` sugar on top.
    let mut input_mappings: IndexMap<String, SourceRef> = IndexMap::new();
    for (input, reference) in raw.input_mappings.into_iter().chain(raw.input) {
        let source_ref = SourceRef::parse(&reference);
        if let Some(source) = &source_ref.source {
            if !depends_on.contains(source) {
                depends_on.push(source.clone());
            }
        }
        input_mappings.insert(input, source_ref);
    }

    let config = raw
        .config
        .into_iter()
        .map(|(key, value)| (key, Value::from_yaml(value)))
        .collect();

    let outputs = raw.outputs.into_iter().flat_map(normalize_output).collect();

    Ok(PipelineModule {
        name,
        id: Some(id),
        depends_on,
        input_mappings,
        config,
        outputs,
        run_mode: raw.run_mode.unwrap_or_default(),
    })
}

fn normalize_output(raw: RawOutput) -> Vec<OutputSpec> {
    match raw {
        RawOutput::Name(name) => vec![OutputSpec { name, mapped: None }],
        RawOutput::Full { name, mapped } => vec![OutputSpec { name, mapped }],
        RawOutput::Mapping(entries) => entries
            .into_iter()
            .map(|(name, mapped)| OutputSpec {
                name,
                mapped: Some(mapped),
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
