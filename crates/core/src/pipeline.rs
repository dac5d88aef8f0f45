// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical pipeline model.
//!
//! This is the normalized form produced by the pipeline loader; the YAML
//! short form (`module:`, `input:`, bare-string outputs) never reaches
//! these types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Execution discipline of a module within a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Once,
    Loop,
    Reactive,
    OnTrigger,
}

impl RunMode {
    /// Continuous modes never complete on their own and hold the pipeline
    /// open until shutdown.
    pub fn is_continuous(self) -> bool {
        matches!(self, RunMode::Loop | RunMode::OnTrigger)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunMode::Once => "once",
            RunMode::Loop => "loop",
            RunMode::Reactive => "reactive",
            RunMode::OnTrigger => "on_trigger",
        };
        write!(f, "{}", name)
    }
}

/// Pipeline-level execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Optional hard wall-clock limit, seconds or a duration string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_max_threads() -> usize {
    4
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            max_threads: default_max_threads(),
        }
    }
}

/// Reference to the source feeding a module input.
///
/// Serialized as `output` or `source-id.output`; the unqualified form means
/// "the named output topic, wherever it is produced".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SourceRef {
    pub source: Option<String>,
    pub output: String,
}

impl SourceRef {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((source, output)) => Self {
                source: Some(source.to_string()),
                output: output.to_string(),
            },
            None => Self {
                source: None,
                output: raw.to_string(),
            },
        }
    }

    pub fn unqualified(output: impl Into<String>) -> Self {
        Self {
            source: None,
            output: output.into(),
        }
    }

    pub fn qualified(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            output: output.into(),
        }
    }
}

impl From<String> for SourceRef {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<SourceRef> for String {
    fn from(value: SourceRef) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}.{}", source, self.output),
            None => write!(f, "{}", self.output),
        }
    }
}

/// Normalized output entry: the declared output name plus an optional topic
/// rename on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped: Option<String>,
}

/// One module entry in a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineModule {
    /// Registry key: the module's manifest name.
    pub name: String,
    /// Pipeline-local identifier; defaults to the lowercased name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub input_mappings: IndexMap<String, SourceRef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub config: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub run_mode: RunMode,
}

impl PipelineModule {
    pub fn effective_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    /// Topic an output is registered under: the mapped name when the
    /// pipeline renames it, the declared name otherwise.
    pub fn output_topic<'a>(&'a self, output_name: &'a str) -> &'a str {
        self.outputs
            .iter()
            .find(|o| o.name == output_name)
            .and_then(|o| o.mapped.as_deref())
            .unwrap_or(output_name)
    }
}

/// A declarative composition of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub execution: ExecutionSettings,
    #[serde(default)]
    pub modules: Vec<PipelineModule>,
}

impl Pipeline {
    pub fn module_by_id(&self, id: &str) -> Option<&PipelineModule> {
        self.modules.iter().find(|m| m.effective_id() == id)
    }

    pub fn module_ids(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.effective_id()).collect()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
