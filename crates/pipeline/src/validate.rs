// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural validation of a normalized pipeline.

use std::collections::{HashMap, HashSet};

use wr_core::Pipeline;

use crate::error::PipelineError;

/// Check id uniqueness, dependency resolution, and graph acyclicity.
pub fn validate_pipeline(pipeline: &Pipeline) -> Result<(), PipelineError> {
    let mut ids = HashSet::new();
    for module in &pipeline.modules {
        let id = module.effective_id();
        if !ids.insert(id.clone()) {
            return Err(PipelineError::DuplicateModuleId(id));
        }
    }

    for module in &pipeline.modules {
        for dependency in &module.depends_on {
            if !ids.contains(dependency.as_str()) {
                return Err(PipelineError::UnknownDependency {
                    module: module.effective_id(),
                    dependency: dependency.clone(),
                });
            }
        }
        for (input, source_ref) in &module.input_mappings {
            if let Some(source) = &source_ref.source {
                if !ids.contains(source.as_str()) {
                    return Err(PipelineError::UnknownSource {
                        module: module.effective_id(),
                        input: input.clone(),
                        source_id: source.clone(),
                    });
                }
            }
        }
    }

    check_acyclic(pipeline)
}

/// Depth-first cycle detection over `depends_on` plus qualified input
/// sources.
fn check_acyclic(pipeline: &Pipeline) -> Result<(), PipelineError> {
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    for module in &pipeline.modules {
        let mut deps: Vec<String> = module.depends_on.clone();
        for source_ref in module.input_mappings.values() {
            if let Some(source) = &source_ref.source {
                if !deps.contains(source) {
                    deps.push(source.clone());
                }
            }
        }
        edges.insert(module.effective_id(), deps);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        id: &str,
        edges: &HashMap<String, Vec<String>>,
        marks: &mut HashMap<String, Mark>,
        path: &mut Vec<String>,
    ) -> Result<(), PipelineError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|p| p == id).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].iter().map(String::as_str).collect();
                cycle.push(id);
                return Err(PipelineError::DependencyCycle(cycle.join(" -> ")));
            }
            None => {}
        }
        marks.insert(id.to_string(), Mark::Visiting);
        path.push(id.to_string());
        if let Some(deps) = edges.get(id) {
            for dep in deps {
                visit(dep, edges, marks, path)?;
            }
        }
        path.pop();
        marks.insert(id.to_string(), Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for id in edges.keys() {
        visit(id, &edges, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
