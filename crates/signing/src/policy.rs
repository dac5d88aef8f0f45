// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security policy: what happens to modules that fail verification.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::verify::VerificationStatus;

/// How strictly module verification is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityMode {
    /// Only verified modules run.
    Paranoid,
    /// Unverified modules require operator approval.
    #[default]
    Default,
    /// Everything runs, with a warning.
    Permissive,
}

impl std::str::FromStr for SecurityMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "paranoid" => Ok(SecurityMode::Paranoid),
            "default" => Ok(SecurityMode::Default),
            "permissive" => Ok(SecurityMode::Permissive),
            other => Err(format!("invalid security mode: {}", other)),
        }
    }
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SecurityMode::Paranoid => "paranoid",
            SecurityMode::Default => "default",
            SecurityMode::Permissive => "permissive",
        };
        write!(f, "{}", name)
    }
}

/// Operator decision for an unverified module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Allow,
    Deny,
    /// Allow, and stop prompting for the rest of the run.
    AlwaysAllow,
}

/// Seam for the operator prompt: interactive in the CLI, scripted in tests,
/// denying everywhere unattended.
pub trait ApprovalPrompt: Send + Sync {
    fn approve_module(&self, module_name: &str, status: VerificationStatus) -> ApprovalDecision;
}

/// Non-interactive default: never approve.
pub struct DenyAll;

impl ApprovalPrompt for DenyAll {
    fn approve_module(&self, _module_name: &str, _status: VerificationStatus) -> ApprovalDecision {
        ApprovalDecision::Deny
    }
}

pub struct SecurityPolicy {
    mode: SecurityMode,
    allow_unverified: AtomicBool,
}

impl SecurityPolicy {
    pub fn new(mode: SecurityMode) -> Self {
        Self {
            mode,
            allow_unverified: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    pub fn set_allow_unverified(&self, allow: bool) {
        self.allow_unverified.store(allow, Ordering::SeqCst);
    }

    pub fn allow_unverified(&self) -> bool {
        self.allow_unverified.load(Ordering::SeqCst)
    }

    /// May this module run, given its verification status?
    pub fn evaluate(
        &self,
        module_name: &str,
        status: VerificationStatus,
        prompt: &dyn ApprovalPrompt,
    ) -> bool {
        if status == VerificationStatus::Verified {
            return true;
        }
        match self.mode {
            SecurityMode::Paranoid => {
                warn!(module = module_name, %status, "module blocked in paranoid mode");
                false
            }
            SecurityMode::Permissive => {
                warn!(module = module_name, %status, "running unverified module");
                true
            }
            SecurityMode::Default => {
                if self.allow_unverified() {
                    warn!(module = module_name, %status, "running unverified module (allow-unverified)");
                    return true;
                }
                match prompt.approve_module(module_name, status) {
                    ApprovalDecision::Allow => {
                        info!(module = module_name, "operator allowed unverified module for this run");
                        true
                    }
                    ApprovalDecision::AlwaysAllow => {
                        info!(module = module_name, "operator allowed unverified modules for this session");
                        self.set_allow_unverified(true);
                        true
                    }
                    ApprovalDecision::Deny => {
                        info!(module = module_name, "operator declined unverified module");
                        false
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
