// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown coordination: the one-shot broadcast event, interrupt
//! handling, and orderly module teardown.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wr_runtime::ModuleHost;

#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the shutdown event. Idempotent.
    pub fn trigger_shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// Handle on the underlying event, for select-style waits.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Install the interrupt handler: the first signal triggers graceful
    /// shutdown, a second exits the process immediately with status 1.
    pub fn install_signal_handler(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!(error = %err, "failed to listen for interrupt signal");
                    return;
                }
                if coordinator.is_shutdown() {
                    warn!("force shutting down");
                    std::process::exit(1);
                }
                info!("shutdown initiated, interrupt again to force quit");
                coordinator.trigger_shutdown();
            }
        })
    }

    /// Shut every module down in parallel, isolating failures per module
    /// (the host logs its own hook errors).
    pub async fn shutdown_modules(&self, hosts: &[Arc<ModuleHost>]) {
        if hosts.is_empty() {
            return;
        }
        info!(count = hosts.len(), "shutting down modules");
        join_all(hosts.iter().map(|host| host.shutdown())).await;
        info!("module shutdown complete");
    }
}
