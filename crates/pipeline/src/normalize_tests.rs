// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::loader::parse_pipeline;
use wr_core::test_support::{pipeline, pipeline_module};

const SHORT_FORM: &str = r#"
pipeline:
  name: keyword-watch
  description: Track keywords across sources
  execution:
    max_threads: 2
  modules:
    - module: KeywordMonitor
      id: monitor
      run_mode: once
      config:
        keywords: "alpha, beta"
      outputs:
        - keywords
    - module: KeywordPrinter
      run_mode: reactive
      input:
        keywords: monitor.keywords
"#;

#[test]
fn short_form_normalizes() {
    let pipeline = parse_pipeline(SHORT_FORM).unwrap();
    assert_eq!(pipeline.name, "keyword-watch");
    assert_eq!(pipeline.execution.max_threads, 2);
    assert_eq!(pipeline.modules.len(), 2);

    let monitor = &pipeline.modules[0];
    assert_eq!(monitor.name, "KeywordMonitor");
    assert_eq!(monitor.effective_id(), "monitor");
    assert_eq!(monitor.outputs.len(), 1);
    assert_eq!(monitor.outputs[0].name, "keywords");
    assert!(monitor.outputs[0].mapped.is_none());

    let printer = &pipeline.modules[1];
    assert_eq!(printer.effective_id(), "keywordprinter");
    let mapping = &printer.input_mappings["keywords"];
    assert_eq!(mapping.source.as_deref(), Some("monitor"));
    assert_eq!(mapping.output, "keywords");
    // Qualified input sugar appended the dependency edge.
    assert_eq!(printer.depends_on, vec!["monitor"]);
}

#[test]
fn flat_document_accepted() {
    let pipeline = parse_pipeline("name: flat\nmodules:\n  - module: M\n").unwrap();
    assert_eq!(pipeline.name, "flat");
    assert_eq!(pipeline.modules[0].effective_id(), "m");
}

#[test]
fn module_entry_without_name_rejected() {
    let result = parse_pipeline("name: broken\nmodules:\n  - id: x\n");
    match result {
        Err(PipelineError::MissingModuleName { index }) => assert_eq!(index, 0),
        other => panic!("expected MissingModuleName, got {:?}", other),
    }
}

#[test]
fn existing_depends_on_not_duplicated() {
    let yaml = r#"
name: p
modules:
  - module: A
    id: a
  - module: B
    id: b
    depends_on: [a]
    input:
      x: a.y
"#;
    let pipeline = parse_pipeline(yaml).unwrap();
    assert_eq!(pipeline.modules[1].depends_on, vec!["a"]);
}

#[yare::parameterized(
    bare_string = { "- keywords\n", "keywords", None },
    mapping     = { "- keywords: tracked\n", "keywords", Some("tracked") },
    full_record = { "- name: keywords\n  mapped: tracked\n", "keywords", Some("tracked") },
)]
fn output_forms_normalize(outputs_yaml: &str, name: &str, mapped: Option<&str>) {
    let yaml = format!(
        "name: p\nmodules:\n  - module: M\n    outputs:\n{}",
        outputs_yaml
            .lines()
            .map(|l| format!("      {}\n", l))
            .collect::<String>()
    );
    let pipeline = parse_pipeline(&yaml).unwrap();
    let output = &pipeline.modules[0].outputs[0];
    assert_eq!(output.name, name);
    assert_eq!(output.mapped.as_deref(), mapped);
}

#[test]
fn config_values_become_payloads() {
    let yaml = r#"
name: p
modules:
  - module: M
    config:
      keywords: "a, b"
      depth: 3
      follow: true
"#;
    let pipeline = parse_pipeline(yaml).unwrap();
    let config = &pipeline.modules[0].config;
    assert_eq!(config["keywords"], wr_core::Value::from("a, b"));
    assert_eq!(config["depth"], wr_core::Value::Int(3));
    assert_eq!(config["follow"], wr_core::Value::Bool(true));
}

#[test]
fn run_mode_defaults_to_once() {
    let pipeline = parse_pipeline("name: p\nmodules:\n  - module: M\n").unwrap();
    assert_eq!(pipeline.modules[0].run_mode, RunMode::Once);
}

// Normalization is a fixed point.
#[test]
fn normalize_is_idempotent() {
    let first = parse_pipeline(SHORT_FORM).unwrap();
    let second = normalize_pipeline(first.clone()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn normalize_is_idempotent_for_built_pipelines() {
    let built = pipeline("demo")
        .timeout("30s")
        .module(
            pipeline_module("Source")
                .id("src")
                .run_mode(RunMode::Once)
                .output_mapped("out", "renamed")
                .config("depth", 2i64)
                .build(),
        )
        .module(
            pipeline_module("Sink")
                .run_mode(RunMode::Reactive)
                .map_input("in", "src.out")
                .depends_on("src")
                .build(),
        )
        .build();

    let once = normalize_pipeline(built).unwrap();
    let twice = normalize_pipeline(once.clone()).unwrap();
    assert_eq!(once, twice);
}
