// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module manifest model (`module.yaml`).
//!
//! Read once at discovery and cached for the run. Parsing is tolerant:
//! missing port types default to `Any`, requirement versions may embed a
//! constraint prefix (`>=1.0`) which is split off.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::TypeName;

/// Manifest file name that marks a directory as a module.
pub const MANIFEST_FILE: &str = "module.yaml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no {MANIFEST_FILE} in {0}")]
    NotFound(PathBuf),

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("module '{module}' declares duplicate port '{port}'")]
    DuplicatePort { module: String, port: String },
}

/// Runtime entry-point section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub main: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,
}

/// A package requirement, `{name}{constraint}{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRequirement")]
pub struct Requirement {
    pub name: String,
    pub constraint: String,
    pub version: String,
}

#[derive(Deserialize)]
struct RawRequirement {
    name: String,
    #[serde(default)]
    version: String,
}

impl From<RawRequirement> for Requirement {
    fn from(raw: RawRequirement) -> Self {
        Requirement::new(raw.name, &raw.version)
    }
}

impl Requirement {
    /// Split an embedded constraint prefix off the version string.
    ///
    /// `">=1.0"` becomes `(">=", "1.0")`; a bare version defaults to exact
    /// matching; an empty version carries no constraint at all.
    pub fn new(name: impl Into<String>, version: &str) -> Self {
        let version = version.trim();
        let split = version.find(|c| !matches!(c, '>' | '<' | '=' | '~' | '!'));
        let (constraint, version) = match split {
            Some(0) => ("==", version),
            Some(idx) => version.split_at(idx),
            None => ("", ""),
        };
        let constraint = if version.is_empty() { "" } else { constraint };
        Self {
            name: name.into(),
            constraint: constraint.to_string(),
            version: version.to_string(),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.name, self.constraint, self.version)
    }
}

/// A declared input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    #[serde(rename = "type", default = "TypeName::any")]
    pub type_name: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
            required: false,
        }
    }
}

/// Per-module manifest record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub repository: String,
    pub runtime: RuntimeSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PortSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PortSpec>,
}

impl ModuleManifest {
    /// Load and validate the manifest inside a module directory.
    pub fn load(module_dir: &Path) -> Result<Self, ManifestError> {
        let path = module_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::NotFound(module_dir.to_path_buf()));
        }
        let raw = std::fs::read_to_string(&path)?;
        let manifest: ModuleManifest = serde_yaml::from_str(&raw)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Input and output names must be unique within the module.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for ports in [&self.inputs, &self.outputs] {
            let mut seen = std::collections::HashSet::new();
            for port in ports {
                if !seen.insert(port.name.as_str()) {
                    return Err(ManifestError::DuplicatePort {
                        module: self.name.clone(),
                        port: port.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// The default output topic is the first declared output.
    pub fn first_output(&self) -> Option<&PortSpec> {
        self.outputs.first()
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
