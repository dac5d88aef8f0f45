// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle driver wrapping a module implementation.
//!
//! The host owns the boxed module behind an async mutex. The bus's delivery
//! path takes the same lock before calling `process_input`, so at most one
//! iteration is in flight per module and input handling never overlaps it.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use wr_bus::{MessageBus, SubscriberCallback};
use wr_core::{Device, Envelope, ModuleManifest, RunMode, Value};

use crate::module::{Module, ModuleCtx, ModuleError, DEFAULT_CYCLE_TIME};
use crate::pool::WorkerPool;
use crate::state::ModuleState;

/// Idle poll interval of the reactive loop.
const REACTIVE_POLL: Duration = Duration::from_millis(100);

pub struct ModuleHost {
    name: String,
    manifest: Arc<ModuleManifest>,
    state: Arc<ModuleState>,
    module: Arc<tokio::sync::Mutex<Box<dyn Module>>>,
    ctx: parking_lot::Mutex<Option<Arc<ModuleCtx>>>,
}

impl ModuleHost {
    pub fn new(manifest: ModuleManifest, module: Box<dyn Module>) -> Self {
        Self {
            name: manifest.name.clone(),
            manifest: Arc::new(manifest),
            state: Arc::new(ModuleState::new()),
            module: Arc::new(tokio::sync::Mutex::new(module)),
            ctx: parking_lot::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    pub fn state(&self) -> &Arc<ModuleState> {
        &self.state
    }

    pub fn run_mode(&self) -> RunMode {
        self.state.run_mode()
    }

    pub fn set_run_mode(&self, mode: RunMode) {
        self.state.set_run_mode(mode);
    }

    /// Called once by the engine before the run, CLI overrides already
    /// merged in.
    pub fn set_arguments(&self, arguments: IndexMap<String, Value>) {
        debug!(module = %self.name, count = arguments.len(), "arguments set");
        self.state.set_arguments(arguments);
    }

    fn ctx(&self) -> Option<Arc<ModuleCtx>> {
        self.ctx.lock().clone()
    }

    /// Bind the module to the bus and worker pool, producing the context
    /// every hook receives. `default_output` is the engine's topic choice
    /// for iteration return values (it knows about pipeline renames);
    /// module and manifest defaults fill in when absent.
    pub async fn bind(
        &self,
        bus: Arc<MessageBus>,
        pool: WorkerPool,
        default_output: Option<String>,
    ) -> Arc<ModuleCtx> {
        let default_output = match default_output {
            Some(topic) => Some(topic),
            None => {
                let module = self.module.lock().await;
                module
                    .default_output_topic()
                    .or_else(|| self.manifest.first_output().map(|p| p.name.clone()))
            }
        };
        let ctx = Arc::new(ModuleCtx::new(
            self.name.clone(),
            Arc::clone(&self.manifest),
            Arc::clone(&self.state),
            bus,
            pool,
            default_output,
        ));
        *self.ctx.lock() = Some(Arc::clone(&ctx));
        ctx
    }

    /// Run the module's `initialize` hook. Requires a prior `bind`.
    pub async fn initialize(&self) {
        let Some(ctx) = self.ctx() else {
            return;
        };
        let mut module = self.module.lock().await;
        module.initialize(&ctx);
    }

    /// Bus callback delivering envelopes into this module.
    ///
    /// Buffers the value, runs the module's `process_input` under the
    /// processing lock, and sets the input-received flag for reactive
    /// modules. Create the callback after `bind`, or the custom hook is
    /// skipped (buffering and flagging still work).
    pub fn subscriber(&self) -> SubscriberCallback {
        let state = Arc::clone(&self.state);
        let module = Arc::clone(&self.module);
        let ctx = self.ctx();
        let name = self.name.clone();
        Arc::new(move |envelope: Envelope| {
            let state = Arc::clone(&state);
            let module = Arc::clone(&module);
            let ctx = ctx.clone();
            let name = name.clone();
            Box::pin(async move {
                state.buffer_input(&envelope.topic, envelope.data.clone());
                if let Some(ctx) = &ctx {
                    let mut module = module.lock().await;
                    module.process_input(&envelope.topic, &envelope.data, ctx);
                }
                if state.run_mode() == RunMode::Reactive {
                    state.flag_input_received();
                    debug!(module = %name, topic = %envelope.topic, "reactive input received");
                }
            })
        })
    }

    /// Drive the module lifecycle to completion or shutdown.
    pub async fn run(&self) {
        let Some(ctx) = self.ctx() else {
            error!(module = %self.name, "module was never wired to a bus, refusing to run");
            return;
        };
        self.state.set_running(true);
        let mode = self.run_mode();
        info!(module = %self.name, run_mode = %mode, "module starting");

        if let Err(err) = self.drive(&ctx, mode).await {
            error!(module = %self.name, error = %err, "fatal module error");
        }

        self.state.set_running(false);
        info!(module = %self.name, "module stopped");
    }

    async fn drive(&self, ctx: &ModuleCtx, mode: RunMode) -> Result<(), ModuleError> {
        {
            let mut module = self.module.lock().await;
            module.before_run(ctx).await?;
        }

        match mode {
            RunMode::Once => {
                if let Err(err) = self.iterate(ctx).await {
                    error!(module = %self.name, error = %err, "error in single execution");
                }
                // Completed even on error, so the monitor can make progress.
                self.state.mark_completed();
                info!(module = %self.name, "module completed");
            }
            RunMode::Loop | RunMode::OnTrigger => {
                let cycle = self.effective_cycle_time(ctx).await;
                while !self.state.is_shutdown() {
                    if let Err(err) = self.iterate(ctx).await {
                        error!(module = %self.name, error = %err, "error in module iteration");
                    }
                    let token = self.state.shutdown_token();
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(cycle) => {}
                    }
                }
            }
            RunMode::Reactive => {
                info!(module = %self.name, "starting reactive mode");
                self.reactive_loop(ctx).await;
            }
        }

        let mut module = self.module.lock().await;
        module.after_run(ctx).await?;
        Ok(())
    }

    async fn reactive_loop(&self, ctx: &ModuleCtx) {
        // Input may have been buffered before the loop started.
        if self.state.take_input_received() || self.state.has_buffered_input() {
            if let Err(err) = self.iterate(ctx).await {
                error!(module = %self.name, error = %err, "error in reactive processing");
            }
        }

        while !self.state.is_shutdown() {
            if self.state.take_input_received() {
                if let Err(err) = self.iterate(ctx).await {
                    error!(module = %self.name, error = %err, "error in reactive processing");
                }
            } else {
                let token = self.state.shutdown_token();
                let _ = tokio::time::timeout(REACTIVE_POLL, token.cancelled()).await;
            }
        }
        debug!(module = %self.name, "exiting reactive loop");
    }

    async fn iterate(&self, ctx: &ModuleCtx) -> Result<(), ModuleError> {
        self.state.set_processing(true);
        let result = {
            let mut module = self.module.lock().await;
            module.run_iteration(ctx).await
        };
        self.state.set_processing(false);

        if let Some(value) = result? {
            match ctx.default_output() {
                Some(topic) => {
                    let topic = topic.to_string();
                    if let Err(err) = ctx.publish(&topic, value).await {
                        warn!(module = %self.name, topic, error = %err, "publish failed");
                    }
                }
                None => debug!(
                    module = %self.name,
                    "iteration produced a value but the module declares no output"
                ),
            }
        }
        Ok(())
    }

    /// Precedence: `cycle_time` argument, module override, default.
    async fn effective_cycle_time(&self, ctx: &ModuleCtx) -> Duration {
        if let Some(arg) = ctx.argument("cycle_time") {
            let parsed = match &arg {
                Value::Str(raw) => wr_core::parse_duration(raw),
                Value::Int(secs) if *secs >= 0 => Some(Duration::from_secs(*secs as u64)),
                Value::Float(secs) if *secs >= 0.0 && secs.is_finite() => {
                    Some(Duration::from_secs_f64(*secs))
                }
                _ => None,
            };
            match parsed {
                Some(cycle) => return cycle,
                None => warn!(module = %self.name, "invalid cycle_time argument, ignoring"),
            }
        }
        let module = self.module.lock().await;
        module.cycle_time().unwrap_or(DEFAULT_CYCLE_TIME)
    }

    /// Signal shutdown and run the module's cleanup hook.
    pub async fn shutdown(&self) {
        let was_running = self.state.is_running();
        self.state.trigger_shutdown();
        if !was_running {
            return;
        }
        info!(module = %self.name, "initiating shutdown");
        if let Some(ctx) = self.ctx() {
            let mut module = self.module.lock().await;
            if let Err(err) = module.on_shutdown(&ctx).await {
                error!(module = %self.name, error = %err, "error during custom shutdown");
            }
        }
        debug!(module = %self.name, "shutdown complete");
    }

    /// Out-of-band command interface for tooling probes.
    ///
    /// Built-ins: `S` status, `R` reset buffered input, `P` process-once.
    /// Anything else goes to the module's `handle_command`; a module busy
    /// in an iteration reports an error device instead of blocking.
    pub fn invoke(&self, command: char) -> Device {
        match command {
            'S' => {
                debug!(module = %self.name, "status check");
                Device::status(&self.name)
            }
            'R' => {
                info!(module = %self.name, "resetting buffered input");
                self.state.clear_buffer();
                Device::reset(&self.name)
            }
            'P' => {
                debug!(module = %self.name, "process command received");
                self.state.flag_input_received();
                Device::process(&self.name)
            }
            other => match self.module.try_lock() {
                Ok(mut module) => module
                    .handle_command(other)
                    .unwrap_or_else(|| Device::unknown(&self.name, other)),
                Err(_) => Device::error(&self.name, "module busy"),
            },
        }
    }

    /// Run the module's dry-run validator.
    pub async fn validate(&self) -> Vec<String> {
        let Some(ctx) = self.ctx() else {
            return vec!["module was never wired to a bus".to_string()];
        };
        let module = self.module.lock().await;
        module.validate(&ctx)
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
