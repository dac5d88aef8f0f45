// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a temp workspace with module and pipeline directories,
//! a factory registry, and engine options tuned for fast tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use wr_bus::MessageBus;
use wr_engine::{Collaborators, EngineOptions, ModuleRegistry, NoInstaller};
use wr_pipeline::PipelineLoader;
use wr_runtime::test_support::{Probe, ScriptedModule};
use wr_runtime::Module;
use wr_signing::{DenyAll, SecurityMode, TrustedSignerStore};

pub struct SpecEnv {
    pub dir: tempfile::TempDir,
    pub registry: Arc<ModuleRegistry>,
}

impl SpecEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            registry: Arc::new(ModuleRegistry::new()),
        }
    }

    pub fn module_dir(&self) -> PathBuf {
        self.dir.path().join("modules")
    }

    pub fn write_module(&self, name: &str, manifest_yaml: &str) -> PathBuf {
        let dir = self.module_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("module.yaml"), manifest_yaml).unwrap();
        dir
    }

    pub fn write_pipeline(&self, name: &str, yaml: &str) {
        let dir = self.dir.path().join("pipelines");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.yaml", name)), yaml).unwrap();
    }

    /// Register a scripted module factory and return its probe.
    pub fn register_scripted<F>(&self, name: &str, configure: F) -> Arc<Probe>
    where
        F: Fn(ScriptedModule) -> ScriptedModule + Send + Sync + 'static,
    {
        let probe = Probe::new();
        let factory_probe = probe.clone();
        self.registry.register(name, move || {
            let module: Box<dyn Module> =
                configure(ScriptedModule::new(factory_probe.clone())).boxed();
            module
        });
        probe
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            loader: PipelineLoader::new(self.dir.path().join("pipelines")),
            module_dir: self.module_dir(),
            registry: Arc::clone(&self.registry),
            installer: Arc::new(NoInstaller),
            signers: TrustedSignerStore::load(
                self.dir.path().join("settings").join("trusted_signers.json"),
            ),
            prompt: Arc::new(DenyAll),
            bus: Arc::new(MessageBus::new()),
        }
    }

    pub fn options(&self, pipeline: &str) -> EngineOptions {
        let mut options = EngineOptions::new(pipeline);
        options.security_mode = SecurityMode::Permissive;
        options.handle_signals = false;
        options.shutdown_grace = Duration::from_secs(2);
        options.monitor_interval = Duration::from_millis(25);
        options
    }
}
