// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit module factory table.
//!
//! Discovery finds manifests on disk; this registry maps a manifest name to
//! the constructor that produces the module implementation. Embedders
//! register their factories before starting the engine.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use wr_runtime::Module;

pub type ModuleFactory = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

#[derive(Default)]
pub struct ModuleRegistry {
    factories: RwLock<HashMap<String, ModuleFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a manifest name. A later registration for
    /// the same name replaces the earlier one.
    pub fn register<F>(&self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        debug!(module = name, "factory registered");
        self.factories
            .write()
            .insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct a fresh instance for a manifest name.
    pub fn create(&self, name: &str) -> Option<Box<dyn Module>> {
        self.factories.read().get(name).map(|factory| factory())
    }
}
