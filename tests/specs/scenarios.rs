// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end pipeline scenarios.

use std::time::{Duration, Instant};

use wr_core::Value;
use wr_engine::{Engine, RunOutcome};
use wr_signing::{SecurityMode, VerificationStatus};

use crate::harness::SpecEnv;

const PRODUCER: &str = "name: producer\nruntime:\n  main: main.rs\noutputs:\n  - name: keywords\n    type: List[str]\n";
const CONSUMER: &str = "name: consumer\nruntime:\n  main: main.rs\ninputs:\n  - name: keywords\n    type: List[str]\n";

// Happy path: a single producer feeding a single consumer.
#[tokio::test]
async fn single_producer_single_consumer() {
    let env = SpecEnv::new();
    env.write_module("producer", PRODUCER);
    env.write_module("consumer", CONSUMER);
    env.write_pipeline(
        "happy",
        r#"
name: happy
modules:
  - module: producer
    id: p
    run_mode: once
  - module: consumer
    id: c
    run_mode: reactive
    input:
      keywords: p.keywords
"#,
    );
    let producer = env.register_scripted("producer", |m| m.emit(Value::from(vec!["alpha", "beta"])));
    let consumer = env.register_scripted("consumer", |m| m);

    let engine = Engine::new(env.options("happy"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(producer.iterations(), 1);

    // The consumer saw the published value exactly once and ran one
    // iteration for it.
    let inputs = consumer.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].0, "keywords");
    assert_eq!(inputs[0].1, Value::from(vec!["alpha", "beta"]));
    assert_eq!(consumer.iterations(), 1);

    // Both modules wound down cleanly.
    assert_eq!(producer.after_runs(), 1);
    assert_eq!(consumer.after_runs(), 1);
}

// Type translation between a declared int output and a str input.
#[tokio::test]
async fn int_output_translated_to_str_input() {
    let env = SpecEnv::new();
    env.write_module(
        "counter",
        "name: counter\nruntime:\n  main: main.rs\noutputs:\n  - name: n\n    type: int\n",
    );
    env.write_module(
        "display",
        "name: display\nruntime:\n  main: main.rs\ninputs:\n  - name: n\n    type: str\n",
    );
    env.write_pipeline(
        "translate",
        r#"
name: translate
modules:
  - module: counter
    id: p
    run_mode: once
  - module: display
    id: c
    run_mode: reactive
    input:
      n: p.n
"#,
    );
    env.register_scripted("counter", |m| m.emit(Value::Int(7)));
    let display = env.register_scripted("display", |m| m);

    let engine = Engine::new(env.options("translate"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    let inputs = display.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].1, Value::from("7"));
}

// Verification rejection in paranoid mode turns the run into a no-op.
#[tokio::test]
async fn paranoid_rejects_unsigned_only_module() {
    let env = SpecEnv::new();
    env.write_module("producer", PRODUCER);
    env.write_pipeline(
        "locked",
        "name: locked\nmodules:\n  - module: producer\n    run_mode: once\n",
    );
    let producer = env.register_scripted("producer", |m| m);

    let mut options = env.options("locked");
    options.security_mode = SecurityMode::Paranoid;
    let engine = Engine::new(options, env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoModules);
    assert!(report.outcome.success());
    assert_eq!(
        report.excluded,
        vec![("producer".to_string(), VerificationStatus::Unsigned)]
    );
    assert_eq!(producer.iterations(), 0);
}

// Graceful shutdown of a loop module mid-run.
#[tokio::test]
async fn graceful_shutdown_of_loop_module() {
    let env = SpecEnv::new();
    env.write_module("watcher", "name: watcher\nruntime:\n  main: main.rs\n");
    env.write_pipeline(
        "watch",
        r#"
name: watch
modules:
  - module: watcher
    run_mode: loop
    config:
      cycle_time: 100ms
"#,
    );
    let watcher = env.register_scripted("watcher", |m| m);

    let engine = Engine::new(env.options("watch"), env.collaborators());
    let coordinator = engine.coordinator();
    let run = tokio::spawn(async move { engine.start().await });

    // External signal after ~2.5 cycles.
    tokio::time::sleep(Duration::from_millis(250)).await;
    coordinator.trigger_shutdown();
    let report = run.await.unwrap().unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.outcome.success());
    let iterations = watcher.iterations();
    assert!(
        (1..=3).contains(&iterations),
        "expected <=3 iterations, saw {}",
        iterations
    );
    assert_eq!(watcher.after_runs(), 1);
}

// Dependency resolution through qualified input mappings.
#[tokio::test]
async fn qualified_mapping_records_dependency() {
    let env = SpecEnv::new();
    env.write_module("a", "name: a\nruntime:\n  main: main.rs\noutputs:\n  - name: seed\n    type: Any\n");
    env.write_module("b", "name: b\nruntime:\n  main: main.rs\noutputs:\n  - name: y\n    type: Any\n");
    env.write_module("c", "name: c\nruntime:\n  main: main.rs\ninputs:\n  - name: x\n    type: Any\n");
    env.write_pipeline(
        "deps",
        r#"
name: deps
modules:
  - module: a
    id: a
    run_mode: once
  - module: b
    id: b
    run_mode: once
    depends_on: [a]
  - module: c
    id: c
    run_mode: reactive
    input:
      x: b.y
"#,
    );
    for name in ["a", "b", "c"] {
        env.register_scripted(name, |m| m);
    }

    let engine = Engine::new(env.options("deps"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.dependencies["b"], vec!["a"]);
    // The qualified mapping implied the edge c -> b.
    assert_eq!(report.dependencies["c"], vec!["b"]);
}

// A pipeline-level timeout forces shutdown.
#[tokio::test]
async fn pipeline_timeout_bounds_the_run() {
    let env = SpecEnv::new();
    env.write_module("forever", "name: forever\nruntime:\n  main: main.rs\n");
    env.write_pipeline(
        "bounded",
        r#"
name: bounded
execution:
  timeout: 400ms
modules:
  - module: forever
    run_mode: loop
    config:
      cycle_time: 50ms
"#,
    );
    let forever = env.register_scripted("forever", |m| m);

    let started = Instant::now();
    let engine = Engine::new(env.options("bounded"), env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::TimedOut);
    assert!(!report.outcome.success());
    // Joined within the grace window, nowhere near a hang.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(forever.iterations() >= 1);
    assert_eq!(forever.after_runs(), 1);
}
