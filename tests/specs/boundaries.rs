// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary behaviors from the runtime contract.

use std::time::{Duration, Instant};

use wr_core::Value;
use wr_engine::{Engine, EngineError, RunOutcome};

use crate::harness::SpecEnv;

#[tokio::test]
async fn zero_module_pipeline_exits_immediately() {
    let env = SpecEnv::new();
    env.write_pipeline("empty", "name: empty\n");

    let started = Instant::now();
    let engine = Engine::new(env.options("empty"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoModules);
    assert!(report.outcome.success());
    // The monitor noticed immediately; no hang waiting for modules.
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn single_once_module_runs_exactly_one_iteration() {
    let env = SpecEnv::new();
    env.write_module(
        "solo",
        "name: solo\nruntime:\n  main: main.rs\noutputs:\n  - name: out\n    type: Any\n",
    );
    env.write_pipeline(
        "solo",
        "name: solo\nmodules:\n  - module: solo\n    run_mode: once\n",
    );
    let solo = env.register_scripted("solo", |m| m);

    let engine = Engine::new(env.options("solo"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(solo.iterations(), 1);
    assert_eq!(solo.before_runs(), 1);
    assert_eq!(solo.after_runs(), 1);
}

#[tokio::test]
async fn conflicting_output_declarations_fail_wiring() {
    let env = SpecEnv::new();
    env.write_module(
        "lister",
        "name: lister\nruntime:\n  main: main.rs\noutputs:\n  - name: found\n    type: List[str]\n",
    );
    env.write_module(
        "mapper",
        "name: mapper\nruntime:\n  main: main.rs\noutputs:\n  - name: found\n    type: dict\n",
    );
    env.write_pipeline(
        "clash",
        "name: clash\nmodules:\n  - module: lister\n    run_mode: once\n  - module: mapper\n    run_mode: once\n",
    );
    env.register_scripted("lister", |m| m);
    env.register_scripted("mapper", |m| m);

    let engine = Engine::new(env.options("clash"), env.collaborators());
    assert!(matches!(engine.start().await, Err(EngineError::Wire(_))));
}

#[tokio::test]
async fn burst_of_inputs_collapses_into_few_iterations() {
    let env = SpecEnv::new();
    env.write_module(
        "burst",
        "name: burst\nruntime:\n  main: main.rs\noutputs:\n  - name: items\n    type: int\n",
    );
    env.write_module(
        "sink",
        "name: sink\nruntime:\n  main: main.rs\ninputs:\n  - name: items\n    type: int\n",
    );
    // A loop producer with a tiny cycle publishes faster than the sink's
    // reactive poll; the sink must coalesce rather than fall behind.
    env.write_pipeline(
        "burst",
        r#"
name: burst
execution:
  timeout: 500ms
modules:
  - module: burst
    id: p
    run_mode: loop
    config:
      cycle_time: 10ms
  - module: sink
    id: c
    run_mode: reactive
    input:
      items: p.items
"#,
    );
    env.register_scripted("burst", |m| m.emit(Value::Int(1)));
    let sink = env.register_scripted("sink", |m| m);

    let engine = Engine::new(env.options("burst"), env.collaborators());
    let report = engine.start().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::TimedOut);

    let delivered = sink.inputs().len();
    let iterations = sink.iterations();
    assert!(delivered >= 5, "expected a burst, saw {}", delivered);
    assert!(iterations >= 1);
    assert!(
        iterations <= delivered,
        "iterations {} should not exceed deliveries {}",
        iterations,
        delivered
    );
}
