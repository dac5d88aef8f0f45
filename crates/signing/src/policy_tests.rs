// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicUsize;

struct Scripted {
    decision: ApprovalDecision,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(decision: ApprovalDecision) -> Self {
        Self {
            decision,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ApprovalPrompt for Scripted {
    fn approve_module(&self, _module: &str, _status: VerificationStatus) -> ApprovalDecision {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decision
    }
}

#[yare::parameterized(
    paranoid   = { "paranoid", SecurityMode::Paranoid },
    default    = { "default", SecurityMode::Default },
    permissive = { "PERMISSIVE", SecurityMode::Permissive },
)]
fn mode_parses(raw: &str, expected: SecurityMode) {
    assert_eq!(raw.parse::<SecurityMode>().unwrap(), expected);
}

#[test]
fn invalid_mode_rejected() {
    assert!("reckless".parse::<SecurityMode>().is_err());
}

#[test]
fn verified_modules_always_allowed() {
    let prompt = Scripted::new(ApprovalDecision::Deny);
    for mode in [
        SecurityMode::Paranoid,
        SecurityMode::Default,
        SecurityMode::Permissive,
    ] {
        let policy = SecurityPolicy::new(mode);
        assert!(policy.evaluate("m", VerificationStatus::Verified, &prompt));
    }
    assert_eq!(prompt.calls(), 0);
}

#[yare::parameterized(
    unsigned = { VerificationStatus::Unsigned },
    invalid  = { VerificationStatus::Invalid },
    error    = { VerificationStatus::Error },
)]
fn paranoid_blocks_everything_unverified(status: VerificationStatus) {
    let policy = SecurityPolicy::new(SecurityMode::Paranoid);
    let prompt = Scripted::new(ApprovalDecision::Allow);
    assert!(!policy.evaluate("m", status, &prompt));
    // Paranoid never prompts.
    assert_eq!(prompt.calls(), 0);
}

#[test]
fn permissive_allows_with_warning_only() {
    let policy = SecurityPolicy::new(SecurityMode::Permissive);
    let prompt = Scripted::new(ApprovalDecision::Deny);
    assert!(policy.evaluate("m", VerificationStatus::Unsigned, &prompt));
    assert_eq!(prompt.calls(), 0);
}

#[test]
fn default_mode_follows_the_prompt() {
    let policy = SecurityPolicy::new(SecurityMode::Default);
    let allow = Scripted::new(ApprovalDecision::Allow);
    assert!(policy.evaluate("m", VerificationStatus::Unsigned, &allow));
    assert_eq!(allow.calls(), 1);

    let deny = Scripted::new(ApprovalDecision::Deny);
    assert!(!policy.evaluate("m", VerificationStatus::Unsigned, &deny));
}

#[test]
fn always_allow_latches_for_the_session() {
    let policy = SecurityPolicy::new(SecurityMode::Default);
    let prompt = Scripted::new(ApprovalDecision::AlwaysAllow);

    assert!(policy.evaluate("m1", VerificationStatus::Unsigned, &prompt));
    assert!(policy.evaluate("m2", VerificationStatus::Invalid, &prompt));
    // Only the first evaluation prompted.
    assert_eq!(prompt.calls(), 1);
    assert!(policy.allow_unverified());
}

#[test]
fn allow_unverified_flag_skips_prompting() {
    let policy = SecurityPolicy::new(SecurityMode::Default);
    policy.set_allow_unverified(true);
    let prompt = Scripted::new(ApprovalDecision::Deny);
    assert!(policy.evaluate("m", VerificationStatus::Unsigned, &prompt));
    assert_eq!(prompt.calls(), 0);
}

#[test]
fn deny_all_denies() {
    assert_eq!(
        DenyAll.approve_module("m", VerificationStatus::Unsigned),
        ApprovalDecision::Deny
    );
}
