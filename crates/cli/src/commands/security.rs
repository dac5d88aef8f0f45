// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wraith security …`: module signing and trusted-signer management.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use wr_engine::env;
use wr_signing::{
    compute_module_hash, read_signature, sign_module, verify_module, TrustedSignerStore,
    VerificationStatus,
};

#[derive(Subcommand)]
pub enum SecurityCommand {
    /// Sign a module directory with a private key
    Sign {
        /// Path to the module directory to sign
        module: PathBuf,
        /// Path to the PEM private key
        #[arg(long, value_name = "FILE")]
        key: PathBuf,
        /// Where to write the signature (default: <module>/module.sig)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Verify a module's signature against the trusted signers
    Verify {
        /// Path to the module directory
        module: PathBuf,
    },
    /// Add a trusted signer's public key
    Trust {
        /// Path to the PEM public key
        #[arg(long, value_name = "FILE")]
        key: PathBuf,
        /// Unique identifier for the signer
        #[arg(long)]
        id: String,
        /// Description of the trusted signer
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Remove a trusted signer
    Untrust {
        /// Identifier of the signer to remove
        id: String,
    },
    /// List all trusted signers
    Signers,
}

pub fn run(command: SecurityCommand) -> Result<()> {
    match command {
        SecurityCommand::Sign {
            module,
            key,
            output,
        } => {
            let pem = std::fs::read_to_string(&key)
                .with_context(|| format!("failed to read key {}", key.display()))?;
            let path = sign_module(&module, &pem, output.as_deref())?;
            println!("module signed successfully: {}", path.display());
            Ok(())
        }
        SecurityCommand::Verify { module } => {
            let signers = TrustedSignerStore::load(env::trusted_signers_file());
            let record = verify_module(&module, &signers);
            println!("status: {}", record.status);
            if let Some(signer) = &record.signer {
                println!("signed by: {}", signer);
            }
            match record.hash.or_else(|| compute_module_hash(&module).ok()) {
                Some(hash) => println!("canonical hash: {}", hash),
                None => println!("canonical hash: <unavailable>"),
            }
            if read_signature(&module).is_none() {
                println!("no signature file found");
            }
            if record.status == VerificationStatus::Verified {
                Ok(())
            } else {
                bail!("module is not verified")
            }
        }
        SecurityCommand::Trust { key, id, comment } => {
            let pem = std::fs::read_to_string(&key)
                .with_context(|| format!("failed to read key {}", key.display()))?;
            let mut signers = TrustedSignerStore::load(env::trusted_signers_file());
            signers.add(&id, &pem, &comment)?;
            println!("added trusted signer: {}", id);
            Ok(())
        }
        SecurityCommand::Untrust { id } => {
            let mut signers = TrustedSignerStore::load(env::trusted_signers_file());
            signers.remove(&id)?;
            println!("removed trusted signer: {}", id);
            Ok(())
        }
        SecurityCommand::Signers => {
            let signers = TrustedSignerStore::load(env::trusted_signers_file());
            if signers.is_empty() {
                println!("no trusted signers found");
                return Ok(());
            }
            for (id, entry) in signers.entries() {
                let preview: String = entry
                    .pubkey
                    .lines()
                    .find(|line| !line.starts_with("-----"))
                    .unwrap_or("")
                    .chars()
                    .take(24)
                    .collect();
                println!("{:<20} {:<32} {}…", id, entry.comment, preview);
            }
            Ok(())
        }
    }
}
