// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wr-engine: The pipeline orchestrator.
//!
//! Ties the loader, discovery, verification, bus wiring, module execution,
//! and shutdown together: load, discover, verify, install requirements,
//! configure, wire, run, monitor, and shut down, in that order.

pub mod env;

mod discovery;
mod engine;
mod error;
mod monitor;
mod registry;
mod shutdown;
mod wiring;

pub use discovery::{
    find_module_dirs, CommandInstaller, DiscoveredModule, InstallError, Installer,
    ModuleDiscovery, NoInstaller,
};
pub use engine::{Collaborators, Engine, EngineOptions, RunOutcome, RunReport};
pub use error::EngineError;
pub use monitor::{all_modules_idle, spawn_monitor, MONITOR_INTERVAL};
pub use registry::{ModuleFactory, ModuleRegistry};
pub use shutdown::ShutdownCoordinator;
pub use wiring::{wire_modules, EngineModule, WireError, WireReport};
