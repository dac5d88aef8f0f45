// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion monitor.
//!
//! Periodically inspects every module's shared state and triggers system
//! shutdown once the pipeline can make no further progress on its own:
//! every `once` module completed, every `reactive` module idle, and no
//! continuous modules present.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use wr_core::RunMode;
use wr_runtime::ModuleState;

use crate::shutdown::ShutdownCoordinator;

pub const MONITOR_INTERVAL: Duration = Duration::from_secs(2);

/// Can the pipeline make no further progress on its own?
///
/// Reactive modules count as busy while an iteration is in flight *or*
/// unconsumed input is pending, so a publish delivered just before a check
/// cannot be mistaken for idleness.
pub fn all_modules_idle(states: &[Arc<ModuleState>]) -> bool {
    for state in states {
        match state.run_mode() {
            RunMode::Once => {
                if !state.is_completed() {
                    return false;
                }
            }
            RunMode::Reactive => {
                if state.is_processing() || state.has_pending_input() {
                    return false;
                }
            }
            RunMode::Loop | RunMode::OnTrigger => return false,
        }
    }
    true
}

/// Spawn the monitor task. Latches once: after triggering shutdown it
/// exits. The observation is eventually consistent by design.
pub fn spawn_monitor(
    states: Vec<Arc<ModuleState>>,
    coordinator: ShutdownCoordinator,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let token = coordinator.token();
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            if all_modules_idle(&states) {
                info!("all modules completed or idle, initiating shutdown");
                coordinator.trigger_shutdown();
                return;
            }
        }
    })
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
