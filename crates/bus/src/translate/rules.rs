// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversion rules: the built-in defaults plus optional YAML rule files.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use wr_core::TypeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SimpleCast,
    SplitString,
    StringToBool,
}

impl Method {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "simple_cast" => Some(Method::SimpleCast),
            "split_string" => Some(Method::SplitString),
            "string_to_bool" => Some(Method::StringToBool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub from: TypeName,
    pub to: TypeName,
    pub method: Method,
}

impl Rule {
    fn new(from: &str, to: &str, method: Method) -> Self {
        Self {
            from: TypeName::new(from),
            to: TypeName::new(to),
            method,
        }
    }
}

/// Always-active defaults, mirrored by the shipped rule file.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("str", "List[str]", Method::SplitString),
        Rule::new("int", "str", Method::SimpleCast),
        Rule::new("float", "str", Method::SimpleCast),
        Rule::new("str", "int", Method::SimpleCast),
        Rule::new("str", "float", Method::SimpleCast),
        Rule::new("str", "bool", Method::StringToBool),
    ]
}

#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rule file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    conversions: IndexMap<String, RuleEntry>,
}

#[derive(Deserialize)]
struct RuleEntry {
    from_type: String,
    to_type: String,
    method: String,
}

/// Load rules from a `{conversions: {name: {from_type, to_type, method}}}`
/// YAML file. Entries with unknown methods are skipped with a warning.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, RuleLoadError> {
    let raw = std::fs::read_to_string(path)?;
    let file: RuleFile = serde_yaml::from_str(&raw)?;
    let mut rules = Vec::with_capacity(file.conversions.len());
    for (name, entry) in file.conversions {
        match Method::parse(&entry.method) {
            Some(method) => rules.push(Rule {
                from: TypeName::new(&entry.from_type),
                to: TypeName::new(&entry.to_type),
                method,
            }),
            None => warn!(rule = %name, method = %entry.method, "unknown conversion method, skipping rule"),
        }
    }
    Ok(rules)
}
