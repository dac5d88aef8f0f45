// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract every pipeline module implements.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use wr_bus::{BusError, MessageBus};
use wr_core::{Device, ModuleManifest, Value};

use crate::pool::{PoolError, WorkerPool};
use crate::state::ModuleState;

/// Pacing for `loop` modules that do not override it.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl ModuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Capabilities handed to every module hook: arguments, buffered input,
/// bus publishing, and blocking-work offload.
pub struct ModuleCtx {
    name: String,
    manifest: Arc<ModuleManifest>,
    state: Arc<ModuleState>,
    bus: Arc<MessageBus>,
    pool: WorkerPool,
    default_output: Option<String>,
}

impl ModuleCtx {
    pub(crate) fn new(
        name: String,
        manifest: Arc<ModuleManifest>,
        state: Arc<ModuleState>,
        bus: Arc<MessageBus>,
        pool: WorkerPool,
        default_output: Option<String>,
    ) -> Self {
        Self {
            name,
            manifest,
            state,
            bus,
            pool,
            default_output,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    /// Argument from the pipeline config (with CLI overrides applied).
    pub fn argument(&self, key: &str) -> Option<Value> {
        self.state.argument(key)
    }

    pub fn argument_or(&self, key: &str, default: Value) -> Value {
        self.state.argument(key).unwrap_or(default)
    }

    pub fn arguments(&self) -> IndexMap<String, Value> {
        self.state.arguments()
    }

    /// Last value received on a subscribed topic.
    pub fn buffered(&self, topic: &str) -> Option<Value> {
        self.state.buffered(topic)
    }

    pub fn buffered_inputs(&self) -> IndexMap<String, Value> {
        self.state.buffered_inputs()
    }

    pub fn has_buffered_input(&self) -> bool {
        self.state.has_buffered_input()
    }

    /// Topic that `run_iteration` return values are published on.
    pub fn default_output(&self) -> Option<&str> {
        self.default_output.as_deref()
    }

    /// Publish on an explicit topic, attributed to this module.
    pub async fn publish(&self, topic: &str, value: Value) -> Result<(), BusError> {
        self.bus
            .publish_from(topic, value, Some(self.name.as_str()))
            .await
    }

    /// Offload blocking or CPU-bound work to the shared worker pool.
    pub async fn run_blocking<F, T>(&self, f: F) -> Result<T, ModuleError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.pool.run_blocking(f).await?)
    }

    pub fn shutdown_requested(&self) -> bool {
        self.state.is_shutdown()
    }

    /// For modules that implement custom waits (`on_trigger` overrides).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown_token()
    }
}

/// A self-describing data-processing unit.
///
/// Default implementations make every hook optional; a minimal module
/// overrides `process_data` (or `run_iteration`) and nothing else.
#[async_trait]
pub trait Module: Send {
    /// Synchronous setup after construction, before any async hook.
    fn initialize(&mut self, _ctx: &ModuleCtx) {}

    /// Once, before the run loop starts. Errors here are fatal to the module.
    async fn before_run(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        Ok(())
    }

    /// One unit of work. A returned value is published on the default
    /// output topic. Errors are logged and contained per iteration.
    async fn run_iteration(&mut self, ctx: &ModuleCtx) -> Result<Option<Value>, ModuleError> {
        Ok(self.process_data(ctx))
    }

    /// Synchronous data step used by the default `run_iteration`.
    fn process_data(&mut self, _ctx: &ModuleCtx) -> Option<Value> {
        None
    }

    /// Called during bus delivery, before the input-received flag is set.
    /// Must not block; heavy work belongs in `run_iteration`.
    fn process_input(&mut self, _topic: &str, _value: &Value, _ctx: &ModuleCtx) {}

    /// Once, after the run loop ends (also on the shutdown path).
    async fn after_run(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Custom cleanup when the module is asked to shut down.
    async fn on_shutdown(&mut self, _ctx: &ModuleCtx) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Loop pacing; `None` defers to the `cycle_time` argument or
    /// [`DEFAULT_CYCLE_TIME`].
    fn cycle_time(&self) -> Option<Duration> {
        None
    }

    /// Override the default output topic; `None` uses the manifest's first
    /// declared output.
    fn default_output_topic(&self) -> Option<String> {
        None
    }

    /// Handle command characters beyond the built-in `S`/`R`/`P`.
    fn handle_command(&mut self, _command: char) -> Option<Device> {
        None
    }

    /// Configuration errors reported by dry-run validation.
    fn validate(&self, _ctx: &ModuleCtx) -> Vec<String> {
        vec![]
    }
}
