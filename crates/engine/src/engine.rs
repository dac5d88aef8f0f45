// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline engine: start-up sequencing, execution, and shutdown.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use wr_bus::MessageBus;
use wr_core::{format_elapsed, parse_duration, Pipeline, Value};
use wr_pipeline::PipelineLoader;
use wr_runtime::{ModuleHost, WorkerPool};
use wr_signing::{
    verify_module, ApprovalPrompt, SecurityMode, SecurityPolicy, TrustedSignerStore,
    VerificationStatus,
};

use crate::discovery::{Installer, ModuleDiscovery};
use crate::error::EngineError;
use crate::monitor::{spawn_monitor, MONITOR_INTERVAL};
use crate::registry::ModuleRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::wiring::{wire_modules, EngineModule};

/// Structured equivalent of the CLI `run` options.
pub struct EngineOptions {
    pub pipeline: String,
    /// `--set id.key=value` overrides, keyed by module id. CLI wins over
    /// pipeline config.
    pub module_settings: HashMap<String, IndexMap<String, Value>>,
    pub dry_run: bool,
    /// Overrides the pipeline's own `execution.timeout`.
    pub timeout: Option<Duration>,
    pub ignore_warnings: bool,
    /// Where the dry-run PASS/FAIL report goes.
    pub output: Option<PathBuf>,
    pub security_mode: SecurityMode,
    pub allow_unverified: bool,
    /// Install the process-wide interrupt handler. Off in tests.
    pub handle_signals: bool,
    /// How long to wait for module tasks before cancelling stragglers.
    pub shutdown_grace: Duration,
    /// Completion-monitor poll interval.
    pub monitor_interval: Duration,
}

impl EngineOptions {
    pub fn new(pipeline: &str) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            module_settings: HashMap::new(),
            dry_run: false,
            timeout: None,
            ignore_warnings: false,
            output: None,
            security_mode: SecurityMode::default(),
            allow_unverified: false,
            handle_signals: true,
            shutdown_grace: Duration::from_secs(30),
            monitor_interval: MONITOR_INTERVAL,
        }
    }
}

/// Injected collaborators (no process singletons).
pub struct Collaborators {
    pub loader: PipelineLoader,
    pub module_dir: PathBuf,
    pub registry: Arc<ModuleRegistry>,
    pub installer: Arc<dyn Installer>,
    pub signers: TrustedSignerStore,
    pub prompt: Arc<dyn ApprovalPrompt>,
    pub bus: Arc<MessageBus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Modules ran and the pipeline wound down on its own or by signal.
    Completed,
    /// Nothing was eligible to run ("partial / no modules to run").
    NoModules,
    /// The pipeline-level timeout forced shutdown.
    TimedOut,
    /// Dry-run validation passed.
    Validated,
    /// Dry-run validation failed.
    ValidationFailed,
}

impl RunOutcome {
    /// Maps to the process exit code: success is 0.
    pub fn success(self) -> bool {
        !matches!(self, RunOutcome::TimedOut | RunOutcome::ValidationFailed)
    }
}

/// What happened, for the CLI and for tests.
pub struct RunReport {
    pub outcome: RunOutcome,
    pub pipeline: String,
    /// Module ids that actually ran (or would run, for dry-run).
    pub modules_run: Vec<String>,
    /// Modules excluded by verification or missing prerequisites.
    pub excluded: Vec<(String, VerificationStatus)>,
    /// Recorded dependency edges, module id -> ids.
    pub dependencies: HashMap<String, Vec<String>>,
    pub validation_errors: Vec<String>,
    pub elapsed: Duration,
}

pub struct Engine {
    options: EngineOptions,
    loader: PipelineLoader,
    module_dir: PathBuf,
    registry: Arc<ModuleRegistry>,
    installer: Arc<dyn Installer>,
    signers: TrustedSignerStore,
    policy: SecurityPolicy,
    prompt: Arc<dyn ApprovalPrompt>,
    bus: Arc<MessageBus>,
    coordinator: ShutdownCoordinator,
}

impl Engine {
    pub fn new(options: EngineOptions, collaborators: Collaborators) -> Self {
        let policy = SecurityPolicy::new(options.security_mode);
        policy.set_allow_unverified(options.allow_unverified);
        Self {
            options,
            loader: collaborators.loader,
            module_dir: collaborators.module_dir,
            registry: collaborators.registry,
            installer: collaborators.installer,
            signers: collaborators.signers,
            policy,
            prompt: collaborators.prompt,
            bus: collaborators.bus,
            coordinator: ShutdownCoordinator::new(),
        }
    }

    /// External handle for triggering shutdown (operator command, tests).
    pub fn coordinator(&self) -> ShutdownCoordinator {
        self.coordinator.clone()
    }

    /// Run the pipeline to completion (or validate it, for dry-run).
    pub async fn start(&self) -> Result<RunReport, EngineError> {
        let started = Instant::now();

        // 1. Load the pipeline; failure refuses the run.
        let pipeline = self.loader.load(&self.options.pipeline)?;
        info!(
            pipeline = %pipeline.name,
            modules = pipeline.modules.len(),
            "pipeline loaded"
        );

        // 2. Worker pool sized from the pipeline.
        let pool = WorkerPool::new(pipeline.execution.max_threads);
        let discovery = ModuleDiscovery::new(
            self.module_dir.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.installer),
        );

        // 3–6. Discover, verify, install, instantiate, configure.
        let (modules, excluded) = self.build_modules(&pipeline, &discovery).await;

        // 7. Wire to the bus. Any conflict is fatal.
        for module in &modules {
            let default_output = module
                .host
                .manifest()
                .first_output()
                .map(|port| module.spec.output_topic(&port.name).to_string());
            module
                .host
                .bind(Arc::clone(&self.bus), pool.clone(), default_output)
                .await;
            module.host.initialize().await;
        }
        let report = wire_modules(&self.bus, &modules)?;

        let module_ids: Vec<String> = modules.iter().map(EngineModule::id).collect();

        // 8. Dry-run: validate and report instead of executing.
        if self.options.dry_run {
            let validation_errors = self.dry_run_validation(&modules).await;
            self.write_validation_report(&validation_errors)?;
            let outcome = if validation_errors.is_empty() || self.options.ignore_warnings {
                if !validation_errors.is_empty() {
                    warn!("proceeding despite validation errors (--force)");
                }
                RunOutcome::Validated
            } else {
                RunOutcome::ValidationFailed
            };
            pool.close().await;
            return Ok(RunReport {
                outcome,
                pipeline: pipeline.name,
                modules_run: module_ids,
                excluded,
                dependencies: report.dependencies,
                validation_errors,
                elapsed: started.elapsed(),
            });
        }

        // 9. Signal handling.
        let signal_task = self
            .options
            .handle_signals
            .then(|| self.coordinator.install_signal_handler());

        // 10. Launch one task per module.
        let hosts: Vec<Arc<ModuleHost>> =
            modules.iter().map(|m| Arc::clone(&m.host)).collect();
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(hosts.len());
        for module in &modules {
            let host = Arc::clone(&module.host);
            let id = module.id();
            info!(module = %id, "starting module");
            tasks.push(tokio::spawn(async move {
                host.run().await;
                info!(module = %id, "module task completed");
            }));
        }

        // 11. Completion monitor.
        let states = hosts.iter().map(|h| Arc::clone(h.state())).collect();
        let monitor = spawn_monitor(
            states,
            self.coordinator.clone(),
            self.options.monitor_interval,
        );

        if modules.is_empty() {
            warn!("partial / no modules to run");
        }

        // 12. Wait for shutdown: monitor, signal, or timeout.
        let timed_out = self.await_shutdown(&pipeline).await;

        // 13. Shutdown procedure.
        self.coordinator.shutdown_modules(&hosts).await;
        self.join_module_tasks(tasks).await;
        monitor.abort();
        if let Some(task) = signal_task {
            task.abort();
        }
        pool.close().await;

        let outcome = if timed_out {
            RunOutcome::TimedOut
        } else if modules.is_empty() {
            RunOutcome::NoModules
        } else {
            RunOutcome::Completed
        };
        info!(
            pipeline = %pipeline.name,
            elapsed = %format_elapsed(started.elapsed()),
            "pipeline finished"
        );
        Ok(RunReport {
            outcome,
            pipeline: pipeline.name,
            modules_run: module_ids,
            excluded,
            dependencies: report.dependencies,
            validation_errors: vec![],
            elapsed: started.elapsed(),
        })
    }

    /// Steps 3–6: discovery, verification, requirements, instantiation,
    /// configuration. Returns the runnable modules and the exclusions.
    async fn build_modules(
        &self,
        pipeline: &Pipeline,
        discovery: &ModuleDiscovery,
    ) -> (Vec<EngineModule>, Vec<(String, VerificationStatus)>) {
        let wanted: HashSet<String> =
            pipeline.modules.iter().map(|m| m.name.clone()).collect();
        let discovered = discovery.discover(Some(&wanted));

        let mut modules = Vec::new();
        let mut excluded = Vec::new();
        for spec in &pipeline.modules {
            let id = spec.effective_id();
            let Some(found) = discovered
                .iter()
                .find(|d| d.manifest.name == spec.name || d.name == spec.name)
            else {
                warn!(module = %spec.name, "module not found in module directory, skipping");
                excluded.push((id, VerificationStatus::Error));
                continue;
            };

            // 4. Verification gate.
            let record = verify_module(&found.path, &self.signers);
            if !self
                .policy
                .evaluate(&spec.name, record.status, self.prompt.as_ref())
            {
                warn!(
                    module = %spec.name,
                    status = %record.status,
                    "module excluded from execution"
                );
                excluded.push((id, record.status));
                continue;
            }

            // 5. Requirements (failures logged, non-fatal).
            discovery.install_requirements(&found.manifest).await;

            // Instantiate through the registry.
            let Some(module) = discovery.instantiate(&found.manifest) else {
                excluded.push((id, record.status));
                continue;
            };
            let host = Arc::new(ModuleHost::new(found.manifest.clone(), module));

            // 6. Configure: pipeline config with CLI overrides on top.
            let mut arguments = spec.config.clone();
            if let Some(overrides) = self.options.module_settings.get(&id) {
                debug!(module = %id, "applying CLI settings");
                for (key, value) in overrides {
                    arguments.insert(key.clone(), value.clone());
                }
            }
            host.set_arguments(arguments);
            host.set_run_mode(spec.run_mode);

            modules.push(EngineModule {
                host,
                spec: spec.clone(),
            });
        }
        (modules, excluded)
    }

    /// Dry-run checks: module validators plus required-input wiring.
    async fn dry_run_validation(&self, modules: &[EngineModule]) -> Vec<String> {
        info!("running in dry run mode, validating configuration");
        let mut errors = Vec::new();
        for module in modules {
            for message in module.host.validate().await {
                errors.push(format!("{}: {}", module.id(), message));
            }
            for port in &module.host.manifest().inputs {
                if port.required && !module.spec.input_mappings.contains_key(&port.name) {
                    errors.push(format!(
                        "{}: required input '{}' has no defined source",
                        module.id(),
                        port.name
                    ));
                }
            }
        }
        if errors.is_empty() {
            info!("configuration validation completed successfully");
        } else {
            for message in &errors {
                error!(error = %message, "configuration validation failed");
            }
        }
        errors
    }

    fn write_validation_report(&self, errors: &[String]) -> Result<(), EngineError> {
        let Some(path) = &self.options.output else {
            return Ok(());
        };
        let mut report = String::from("Pipeline configuration validation:\n");
        if errors.is_empty() {
            report.push_str("PASSED - all modules configured correctly\n");
        } else {
            report.push_str("FAILED with errors:\n");
            for message in errors {
                report.push_str(&format!("  - {}\n", message));
            }
        }
        std::fs::write(path, report).map_err(EngineError::Report)?;
        info!(path = %path.display(), "validation results written");
        Ok(())
    }

    /// Step 12: returns whether the timeout forced the shutdown.
    async fn await_shutdown(&self, pipeline: &Pipeline) -> bool {
        let timeout = self.options.timeout.or_else(|| {
            pipeline
                .execution
                .timeout
                .as_deref()
                .and_then(parse_duration)
        });
        match timeout {
            Some(limit) => {
                info!(timeout = ?limit, "pipeline execution timeout set");
                let result =
                    tokio::time::timeout(limit, self.coordinator.wait_for_shutdown()).await;
                if result.is_err() {
                    warn!(timeout = ?limit, "pipeline execution timed out");
                    self.coordinator.trigger_shutdown();
                    return true;
                }
                false
            }
            None => {
                self.coordinator.wait_for_shutdown().await;
                false
            }
        }
    }

    /// Step 13: bounded wait for run tasks, then cancel stragglers.
    async fn join_module_tasks(&self, tasks: Vec<JoinHandle<()>>) {
        if tasks.is_empty() {
            return;
        }
        let deadline = tokio::time::Instant::now() + self.options.shutdown_grace;
        for mut task in tasks {
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "module task failed"),
                Err(_) => {
                    warn!("timeout waiting for module task to complete, cancelling");
                    task.abort();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
