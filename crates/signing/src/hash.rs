// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical module hashing.
//!
//! The hash is SHA-256 over the concatenated contents of every file in the
//! module directory, enumerated recursively and sorted lexicographically by
//! path. Excluded: the signature file itself, cache directories, dot
//! directories, and compiled artifacts. Signers and verifiers must agree on
//! this enumeration bit-for-bit.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

/// Detached signature file, excluded from the hash.
pub const SIGNATURE_FILE: &str = "module.sig";

const SKIP_DIRS: [&str; 2] = ["__pycache__", "target"];
const SKIP_SUFFIXES: [&str; 1] = [".pyc"];

#[derive(Debug, Error)]
pub enum HashError {
    #[error("module path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compute the canonical hex-encoded SHA-256 hash of a module directory.
pub fn compute_module_hash(module_dir: &Path) -> Result<String, HashError> {
    if !module_dir.is_dir() {
        return Err(HashError::NotADirectory(module_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_files(module_dir, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for path in files {
        match std::fs::read(&path) {
            Ok(bytes) => hasher.update(&bytes),
            // Unreadable files are skipped, as the signing side skips them.
            Err(err) => warn!(path = %path.display(), error = %err, "failed to read file for hashing"),
        }
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), HashError> {
    let entries = std::fs::read_dir(dir).map_err(|source| HashError::Walk {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            collect_files(&path, files)?;
        } else {
            if name == SIGNATURE_FILE || SKIP_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                continue;
            }
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
