// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory resolution with environment overrides.

use std::path::PathBuf;

/// Overrides the module search directory (default `./modules`).
pub const MODULE_DIR_ENV: &str = "MODULE_DIR";

/// Overrides the pipeline directory (default `./pipelines`).
pub const PIPELINE_DIR_ENV: &str = "PIPELINE_DIR";

/// Overrides the settings directory holding the trusted-signer store and
/// translation rules (default: the user config dir, falling back to
/// `./settings`).
pub const SETTINGS_DIR_ENV: &str = "WRAITH_SETTINGS_DIR";

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn module_dir() -> PathBuf {
    env_path(MODULE_DIR_ENV).unwrap_or_else(|| PathBuf::from("modules"))
}

pub fn pipeline_dir() -> PathBuf {
    env_path(PIPELINE_DIR_ENV).unwrap_or_else(|| PathBuf::from("pipelines"))
}

pub fn settings_dir() -> PathBuf {
    env_path(SETTINGS_DIR_ENV).unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("wraith"))
            .unwrap_or_else(|| PathBuf::from("settings"))
    })
}

pub fn trusted_signers_file() -> PathBuf {
    settings_dir().join("trusted_signers.json")
}

pub fn translation_rules_file() -> PathBuf {
    settings_dir().join("translation_rules.yaml")
}
