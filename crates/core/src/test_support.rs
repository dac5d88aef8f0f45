// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use indexmap::IndexMap;

use crate::manifest::{ModuleManifest, PortSpec, Requirement, RuntimeSpec};
use crate::pipeline::{
    ExecutionSettings, OutputSpec, Pipeline, PipelineModule, RunMode, SourceRef,
};
use crate::value::Value;

// ── Manifest builder ────────────────────────────────────────────────────

pub struct ManifestBuilder {
    manifest: ModuleManifest,
}

pub fn manifest(name: &str) -> ManifestBuilder {
    ManifestBuilder {
        manifest: ModuleManifest {
            name: name.to_string(),
            alias: name.to_string(),
            creator: "tests".to_string(),
            description: format!("test module {}", name),
            version: "0.0.0".to_string(),
            repository: String::new(),
            runtime: RuntimeSpec {
                main: "main.rs".to_string(),
                tests: vec![],
            },
            requirements: vec![],
            inputs: vec![],
            outputs: vec![],
        },
    }
}

impl ManifestBuilder {
    pub fn input(mut self, name: &str, type_name: &str) -> Self {
        self.manifest.inputs.push(PortSpec::new(name, type_name));
        self
    }

    pub fn required_input(mut self, name: &str, type_name: &str) -> Self {
        let mut port = PortSpec::new(name, type_name);
        port.required = true;
        self.manifest.inputs.push(port);
        self
    }

    pub fn output(mut self, name: &str, type_name: &str) -> Self {
        self.manifest.outputs.push(PortSpec::new(name, type_name));
        self
    }

    pub fn requirement(mut self, name: &str, version: &str) -> Self {
        self.manifest.requirements.push(Requirement::new(name, version));
        self
    }

    pub fn build(self) -> ModuleManifest {
        self.manifest
    }

    /// Render as YAML for writing a `module.yaml` fixture.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.manifest).unwrap_or_default()
    }
}

// ── Pipeline builders ───────────────────────────────────────────────────

pub struct PipelineModuleBuilder {
    module: PipelineModule,
}

pub fn pipeline_module(name: &str) -> PipelineModuleBuilder {
    PipelineModuleBuilder {
        module: PipelineModule {
            name: name.to_string(),
            id: None,
            depends_on: vec![],
            input_mappings: IndexMap::new(),
            config: IndexMap::new(),
            outputs: vec![],
            run_mode: RunMode::Once,
        },
    }
}

impl PipelineModuleBuilder {
    pub fn id(mut self, id: &str) -> Self {
        self.module.id = Some(id.to_string());
        self
    }

    pub fn depends_on(mut self, id: &str) -> Self {
        self.module.depends_on.push(id.to_string());
        self
    }

    pub fn map_input(mut self, input: &str, source: &str) -> Self {
        self.module
            .input_mappings
            .insert(input.to_string(), SourceRef::parse(source));
        self
    }

    pub fn config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.module.config.insert(key.to_string(), value.into());
        self
    }

    pub fn output_mapped(mut self, name: &str, mapped: &str) -> Self {
        self.module.outputs.push(OutputSpec {
            name: name.to_string(),
            mapped: Some(mapped.to_string()),
        });
        self
    }

    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.module.run_mode = mode;
        self
    }

    pub fn build(self) -> PipelineModule {
        self.module
    }
}

pub struct PipelineBuilder {
    pipeline: Pipeline,
}

pub fn pipeline(name: &str) -> PipelineBuilder {
    PipelineBuilder {
        pipeline: Pipeline {
            name: name.to_string(),
            description: None,
            execution: ExecutionSettings::default(),
            modules: vec![],
        },
    }
}

impl PipelineBuilder {
    pub fn module(mut self, module: PipelineModule) -> Self {
        self.pipeline.modules.push(module);
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.pipeline.execution.timeout = Some(timeout.to_string());
        self
    }

    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.pipeline.execution.max_threads = max_threads;
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }

    /// Render as YAML for writing a pipeline fixture.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.pipeline).unwrap_or_default()
    }
}

// ── Proptest strategies ─────────────────────────────────────────────────

#[cfg(any(test, feature = "test-support"))]
pub mod strategies {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use crate::value::Value;

    /// Scalar payloads (no nesting) for translator round-trip properties.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1e12f64..1e12f64).prop_map(Value::Float),
            "[ -~]{0,32}".prop_map(Value::Str),
        ]
    }

    /// Scalars plus one level of list/map nesting.
    pub fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            arb_scalar(),
            vec(arb_scalar(), 0..4).prop_map(Value::List),
            vec(("[a-z]{1,8}", arb_scalar()), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    }
}
