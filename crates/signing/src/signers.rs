// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trusted-signer store persisted as a JSON file.
//!
//! Shape on disk: `{ "<signer-id>": { "pubkey": "<PEM>", "comment": "…" } }`.
//! The map is ordered, so add-then-remove restores the previous bytes.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rsa::pkcs8::DecodePublicKey;
use rsa::pss::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum SignerStoreError {
    #[error("invalid public key for '{signer}': {reason}")]
    InvalidKey { signer: String, reason: String },

    #[error("unknown signer '{0}'")]
    UnknownSigner(String),

    #[error("failed to write signer store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode signer store: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry {
    pub pubkey: String,
    #[serde(default)]
    pub comment: String,
}

pub struct TrustedSignerStore {
    path: PathBuf,
    signers: IndexMap<String, SignerEntry>,
}

impl TrustedSignerStore {
    /// Load the store, treating a missing or unreadable file as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let signers = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(signers) => signers,
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to parse trusted signers file");
                    IndexMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "trusted signers file not found");
                IndexMap::new()
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to load trusted signers file");
                IndexMap::new()
            }
        };
        Self { path, signers }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.signers.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SignerEntry)> {
        self.signers.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn get(&self, signer_id: &str) -> Option<&SignerEntry> {
        self.signers.get(signer_id)
    }

    /// Add a signer after validating the PEM key, then persist.
    pub fn add(
        &mut self,
        signer_id: &str,
        pubkey_pem: &str,
        comment: &str,
    ) -> Result<(), SignerStoreError> {
        RsaPublicKey::from_public_key_pem(pubkey_pem).map_err(|err| {
            SignerStoreError::InvalidKey {
                signer: signer_id.to_string(),
                reason: err.to_string(),
            }
        })?;
        self.signers.insert(
            signer_id.to_string(),
            SignerEntry {
                pubkey: pubkey_pem.to_string(),
                comment: comment.to_string(),
            },
        );
        self.save()
    }

    /// Remove a signer, then persist.
    pub fn remove(&mut self, signer_id: &str) -> Result<(), SignerStoreError> {
        if self.signers.shift_remove(signer_id).is_none() {
            return Err(SignerStoreError::UnknownSigner(signer_id.to_string()));
        }
        self.save()
    }

    fn save(&self) -> Result<(), SignerStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(&self.signers)?;
        std::fs::write(&self.path, encoded)?;
        Ok(())
    }

    /// Parsed public key for a signer, `None` when absent or malformed.
    pub fn public_key(&self, signer_id: &str) -> Option<RsaPublicKey> {
        let entry = self.signers.get(signer_id)?;
        match RsaPublicKey::from_public_key_pem(&entry.pubkey) {
            Ok(key) => Some(key),
            Err(err) => {
                error!(signer = signer_id, error = %err, "failed to load public key");
                None
            }
        }
    }

    /// RSA-PSS (MGF1-SHA-256, salt length = digest length) verification
    /// against one signer.
    pub fn verify_signature(&self, data: &[u8], signature: &[u8], signer_id: &str) -> bool {
        let Some(key) = self.public_key(signer_id) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(signature) else {
            warn!(signer = signer_id, "malformed signature");
            return false;
        };
        let verifying_key = VerifyingKey::<Sha256>::new(key);
        match verifying_key.verify(data, &signature) {
            Ok(()) => true,
            Err(_) => {
                debug!(signer = signer_id, "signature does not verify");
                false
            }
        }
    }

    /// Which trusted signer, if any, produced this signature over `data`.
    pub fn find_signature_signer(&self, data: &[u8], signature: &[u8]) -> Option<String> {
        self.signers
            .keys()
            .find(|id| self.verify_signature(data, signature, id))
            .cloned()
    }
}

#[cfg(test)]
#[path = "signers_tests.rs"]
mod tests;
