// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module discovery: directory walk, manifest reads, requirement
//! installation, instantiation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use wr_core::{ModuleManifest, Requirement};
use wr_runtime::Module;

use crate::registry::ModuleRegistry;

const SKIP_DIRS: [&str; 2] = ["__pycache__", "target"];

/// A module directory found on disk with its parsed manifest.
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    /// Directory basename, the key pipelines filter by.
    pub name: String,
    pub path: PathBuf,
    pub manifest: ModuleManifest,
}

/// Recursively find directories containing a `module.yaml`, relative to
/// `base`, sorted. Cache and VCS directories are skipped.
pub fn find_module_dirs(base: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    scan(base, Path::new(""), &mut found);
    found.sort();
    found
}

fn scan(base: &Path, relative: &Path, found: &mut Vec<PathBuf>) {
    let dir = base.join(relative);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            let rel = relative.join(&name);
            if path.join(wr_core::manifest::MANIFEST_FILE).is_file() {
                found.push(rel.clone());
            }
            scan(base, &rel, found);
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InstallError(pub String);

/// Seam for the external package manager that resolves module
/// requirements. Failures are logged and non-fatal to discovery.
#[async_trait]
pub trait Installer: Send + Sync {
    fn is_installed(&self, requirement: &Requirement) -> bool;
    async fn install(&self, requirement: &Requirement) -> Result<(), InstallError>;
}

/// Treats every requirement as already satisfied.
pub struct NoInstaller;

#[async_trait]
impl Installer for NoInstaller {
    fn is_installed(&self, _requirement: &Requirement) -> bool {
        true
    }

    async fn install(&self, _requirement: &Requirement) -> Result<(), InstallError> {
        Ok(())
    }
}

/// Shells out to a package-manager command (`<program> <args…> <req>`).
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    installed: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: &str, args: &[&str], installed: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            installed,
        }
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    fn is_installed(&self, requirement: &Requirement) -> bool {
        self.installed.iter().any(|name| name == &requirement.name)
    }

    async fn install(&self, requirement: &Requirement) -> Result<(), InstallError> {
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(requirement.to_string())
            .status()
            .await
            .map_err(|err| InstallError(format!("failed to spawn {}: {}", self.program, err)))?;
        if status.success() {
            Ok(())
        } else {
            Err(InstallError(format!(
                "{} exited with {} for {}",
                self.program, status, requirement
            )))
        }
    }
}

pub struct ModuleDiscovery {
    base_dir: PathBuf,
    registry: Arc<ModuleRegistry>,
    installer: Arc<dyn Installer>,
}

impl ModuleDiscovery {
    pub fn new(
        base_dir: PathBuf,
        registry: Arc<ModuleRegistry>,
        installer: Arc<dyn Installer>,
    ) -> Self {
        Self {
            base_dir,
            registry,
            installer,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Walk the module directory and parse every manifest, optionally
    /// filtered to the names a pipeline references. Manifest errors are
    /// logged and the module skipped.
    pub fn discover(&self, filter: Option<&HashSet<String>>) -> Vec<DiscoveredModule> {
        let mut discovered = Vec::new();
        for relative in find_module_dirs(&self.base_dir) {
            let path = self.base_dir.join(&relative);
            let dir_name = relative
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let manifest = match ModuleManifest::load(&path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warn!(module = %dir_name, error = %err, "skipping module with invalid manifest");
                    continue;
                }
            };

            if let Some(wanted) = filter {
                if !wanted.contains(&dir_name) && !wanted.contains(&manifest.name) {
                    continue;
                }
            }

            debug!(module = %manifest.name, path = %path.display(), "module discovered");
            discovered.push(DiscoveredModule {
                name: dir_name,
                path,
                manifest,
            });
        }
        discovered
    }

    /// Install the manifest's missing requirements. Failures are logged;
    /// the module may later fail to initialize.
    pub async fn install_requirements(&self, manifest: &ModuleManifest) {
        for requirement in &manifest.requirements {
            if self.installer.is_installed(requirement) {
                continue;
            }
            info!(
                module = %manifest.name,
                requirement = %requirement,
                "installing missing requirement"
            );
            if let Err(err) = self.installer.install(requirement).await {
                warn!(
                    module = %manifest.name,
                    requirement = %requirement,
                    error = %err,
                    "requirement installation failed"
                );
            }
        }
    }

    /// Construct the module implementation from the registry.
    pub fn instantiate(&self, manifest: &ModuleManifest) -> Option<Box<dyn Module>> {
        match self.registry.create(&manifest.name) {
            Some(module) => Some(module),
            None => {
                warn!(
                    module = %manifest.name,
                    "no factory registered for module, skipping"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
