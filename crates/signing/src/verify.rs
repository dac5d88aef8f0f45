// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module verification and signing.
//!
//! The signed message is the ASCII hex string of the canonical hash (the
//! bytes of the hex text, not the raw digest); signers and verifiers must
//! agree on this exactly.

use std::path::{Path, PathBuf};

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::hash::{compute_module_hash, HashError, SIGNATURE_FILE};
use crate::signers::TrustedSignerStore;

/// Per-module verification outcome, recomputed on every run start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// Signed by a trusted signer.
    Verified,
    /// No signature file.
    Unsigned,
    /// A signature exists but no trusted signer verifies it.
    Invalid,
    /// The module could not be examined.
    Error,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Unsigned => "unsigned",
            VerificationStatus::Invalid => "invalid",
            VerificationStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub status: VerificationStatus,
    pub signer: Option<String>,
    pub hash: Option<String>,
}

impl VerificationRecord {
    fn error() -> Self {
        Self {
            status: VerificationStatus::Error,
            signer: None,
            hash: None,
        }
    }
}

/// Read the detached signature file, `None` when absent or unreadable.
pub fn read_signature(module_dir: &Path) -> Option<Vec<u8>> {
    let path = module_dir.join(SIGNATURE_FILE);
    if !path.is_file() {
        debug!(module = %module_dir.display(), "no signature file");
        return None;
    }
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read signature file");
            None
        }
    }
}

/// Verify a module directory against the trusted signers.
pub fn verify_module(module_dir: &Path, signers: &TrustedSignerStore) -> VerificationRecord {
    if !module_dir.is_dir() {
        warn!(module = %module_dir.display(), "cannot verify non-existent module path");
        return VerificationRecord::error();
    }

    let hash = match compute_module_hash(module_dir) {
        Ok(hash) => hash,
        Err(err) => {
            warn!(module = %module_dir.display(), error = %err, "failed to compute module hash");
            return VerificationRecord::error();
        }
    };

    let Some(signature) = read_signature(module_dir) else {
        return VerificationRecord {
            status: VerificationStatus::Unsigned,
            signer: None,
            hash: Some(hash),
        };
    };

    match signers.find_signature_signer(hash.as_bytes(), &signature) {
        Some(signer) => {
            info!(module = %module_dir.display(), signer = %signer, "module verified");
            VerificationRecord {
                status: VerificationStatus::Verified,
                signer: Some(signer),
                hash: Some(hash),
            }
        }
        None => {
            warn!(module = %module_dir.display(), "signature does not match any trusted signer");
            VerificationRecord {
                status: VerificationStatus::Invalid,
                signer: None,
                hash: Some(hash),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("failed to write signature: {0}")]
    Io(#[from] std::io::Error),
}

/// Sign a module directory, writing the detached signature next to the
/// manifest (or to `output` when given). Returns the signature path.
pub fn sign_module(
    module_dir: &Path,
    private_key_pem: &str,
    output: Option<&Path>,
) -> Result<PathBuf, SignError> {
    let key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
        .map_err(|err| SignError::InvalidKey(err.to_string()))?;

    let hash = compute_module_hash(module_dir)?;
    let signing_key = SigningKey::<Sha256>::new(key);
    let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), hash.as_bytes());

    let sig_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| module_dir.join(SIGNATURE_FILE));
    std::fs::write(&sig_path, signature.to_bytes())?;
    info!(module = %module_dir.display(), path = %sig_path.display(), "module signed");
    Ok(sig_path)
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
