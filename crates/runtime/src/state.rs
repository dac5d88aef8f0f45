// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared per-module run state.
//!
//! One instance per module, shared between the lifecycle host, the bus
//! subscriber callbacks, and the engine's completion monitor.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

use wr_core::{RunMode, Value};

pub struct ModuleState {
    running: AtomicBool,
    /// Latched by `once` modules after their single iteration.
    completed: AtomicBool,
    /// A `run_iteration` is in flight.
    processing: AtomicBool,
    /// New input arrived since the last reactive iteration.
    input_received: AtomicBool,
    run_mode: Mutex<RunMode>,
    arguments: Mutex<IndexMap<String, Value>>,
    /// Last value seen per subscribed topic.
    buffer: Mutex<IndexMap<String, Value>>,
    shutdown: CancellationToken,
}

impl Default for ModuleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            processing: AtomicBool::new(false),
            input_received: AtomicBool::new(false),
            run_mode: Mutex::new(RunMode::default()),
            arguments: Mutex::new(IndexMap::new()),
            buffer: Mutex::new(IndexMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub fn set_processing(&self, processing: bool) {
        self.processing.store(processing, Ordering::SeqCst);
    }

    pub fn flag_input_received(&self) {
        self.input_received.store(true, Ordering::SeqCst);
    }

    /// Consume the input-received flag (one reactive iteration per edge).
    pub fn take_input_received(&self) -> bool {
        self.input_received.swap(false, Ordering::SeqCst)
    }

    /// Peek the flag without consuming it (monitor idle check).
    pub fn has_pending_input(&self) -> bool {
        self.input_received.load(Ordering::SeqCst)
    }

    pub fn run_mode(&self) -> RunMode {
        *self.run_mode.lock()
    }

    pub fn set_run_mode(&self, mode: RunMode) {
        *self.run_mode.lock() = mode;
    }

    pub fn set_arguments(&self, arguments: IndexMap<String, Value>) {
        *self.arguments.lock() = arguments;
    }

    pub fn argument(&self, key: &str) -> Option<Value> {
        self.arguments.lock().get(key).cloned()
    }

    pub fn arguments(&self) -> IndexMap<String, Value> {
        self.arguments.lock().clone()
    }

    pub fn buffer_input(&self, topic: &str, value: Value) {
        self.buffer.lock().insert(topic.to_string(), value);
    }

    pub fn buffered(&self, topic: &str) -> Option<Value> {
        self.buffer.lock().get(topic).cloned()
    }

    pub fn buffered_inputs(&self) -> IndexMap<String, Value> {
        self.buffer.lock().clone()
    }

    pub fn has_buffered_input(&self) -> bool {
        !self.buffer.lock().is_empty()
    }

    pub fn clear_buffer(&self) {
        self.buffer.lock().clear();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
