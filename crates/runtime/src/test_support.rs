// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fake modules for host, engine, and workspace tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use wr_core::{Device, Value, DEVICE_FIRMWARE};

use crate::module::{Module, ModuleCtx, ModuleError};

/// Shared observation point for a scripted module's hook calls.
#[derive(Default)]
pub struct Probe {
    iterations: AtomicUsize,
    before_runs: AtomicUsize,
    after_runs: AtomicUsize,
    shutdowns: AtomicUsize,
    inputs: Mutex<Vec<(String, Value)>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn iterations(&self) -> usize {
        self.iterations.load(Ordering::SeqCst)
    }

    pub fn before_runs(&self) -> usize {
        self.before_runs.load(Ordering::SeqCst)
    }

    pub fn after_runs(&self) -> usize {
        self.after_runs.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<(String, Value)> {
        self.inputs.lock().clone()
    }
}

/// Configurable [`Module`] whose behavior is scripted per test.
pub struct ScriptedModule {
    probe: Arc<Probe>,
    emit: Option<Value>,
    fail_before: bool,
    fail_iteration: bool,
    cycle: Option<Duration>,
    validation_errors: Vec<String>,
}

impl ScriptedModule {
    pub fn new(probe: Arc<Probe>) -> Self {
        Self {
            probe,
            emit: None,
            fail_before: false,
            fail_iteration: false,
            cycle: None,
            validation_errors: vec![],
        }
    }

    /// Value each iteration returns for publishing.
    pub fn emit(mut self, value: Value) -> Self {
        self.emit = Some(value);
        self
    }

    pub fn fail_before(mut self) -> Self {
        self.fail_before = true;
        self
    }

    pub fn fail_iteration(mut self) -> Self {
        self.fail_iteration = true;
        self
    }

    pub fn cycle(mut self, cycle: Duration) -> Self {
        self.cycle = Some(cycle);
        self
    }

    pub fn validation_error(mut self, message: &str) -> Self {
        self.validation_errors.push(message.to_string());
        self
    }

    pub fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }
}

#[async_trait]
impl Module for ScriptedModule {
    async fn before_run(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        self.probe.before_runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_before {
            return Err(ModuleError::failed("scripted before_run failure"));
        }
        Ok(())
    }

    async fn run_iteration(&mut self, _ctx: &ModuleCtx) -> Result<Option<Value>, ModuleError> {
        self.probe.iterations.fetch_add(1, Ordering::SeqCst);
        if self.fail_iteration {
            return Err(ModuleError::failed("scripted iteration failure"));
        }
        Ok(self.emit.clone())
    }

    fn process_input(&mut self, topic: &str, value: &Value, _ctx: &ModuleCtx) {
        self.probe
            .inputs
            .lock()
            .push((topic.to_string(), value.clone()));
    }

    async fn after_run(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        self.probe.after_runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_shutdown(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        self.probe.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn cycle_time(&self) -> Option<Duration> {
        self.cycle
    }

    fn handle_command(&mut self, command: char) -> Option<Device> {
        (command == 'C').then(|| Device {
            name: "scripted".to_string(),
            firmware: DEVICE_FIRMWARE,
            protocol: "CUSTOM".to_string(),
            errors: vec![],
        })
    }

    fn validate(&self, _ctx: &ModuleCtx) -> Vec<String> {
        self.validation_errors.clone()
    }
}
