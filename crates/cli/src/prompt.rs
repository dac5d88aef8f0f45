// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive operator prompt for unverified modules.

use std::io::Write;

use wr_signing::{ApprovalDecision, ApprovalPrompt, VerificationStatus};

pub struct TerminalPrompt;

impl ApprovalPrompt for TerminalPrompt {
    fn approve_module(&self, module_name: &str, status: VerificationStatus) -> ApprovalDecision {
        let status_message = match status {
            VerificationStatus::Unsigned => "unsigned",
            VerificationStatus::Invalid => "has an INVALID signature",
            VerificationStatus::Error => "could not be verified due to an error",
            VerificationStatus::Verified => return ApprovalDecision::Allow,
        };

        println!();
        println!("SECURITY WARNING: module '{}' is {}", module_name, status_message);
        println!("This module has not been verified by any trusted signer.");
        println!("Running unverified modules can be a security risk.");
        println!();

        loop {
            print!("Do you want to proceed with this module? (yes/no/always): ");
            if std::io::stdout().flush().is_err() {
                return ApprovalDecision::Deny;
            }
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return ApprovalDecision::Deny;
            }
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return ApprovalDecision::Allow,
                "n" | "no" => return ApprovalDecision::Deny,
                "always" => return ApprovalDecision::AlwaysAllow,
                _ => println!("Invalid choice. Please enter 'yes', 'no', or 'always'."),
            }
        }
    }
}
