// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wraith list pipelines` / `wraith list modules`.

use clap::Subcommand;

use wr_engine::{env, ModuleDiscovery, ModuleRegistry, NoInstaller};
use wr_pipeline::PipelineLoader;
use wr_signing::{verify_module, TrustedSignerStore};

use crate::exit_error::ExitError;

#[derive(Subcommand)]
pub enum ListCommand {
    /// List available pipelines
    Pipelines {
        /// Only show pipelines whose name contains this string
        filter: Option<String>,
    },
    /// List discovered modules with verification status
    Modules {
        /// Only show modules whose name contains this string
        filter: Option<String>,
    },
}

pub fn run(command: ListCommand) -> Result<(), ExitError> {
    match command {
        ListCommand::Pipelines { filter } => list_pipelines(filter.as_deref()),
        ListCommand::Modules { filter } => list_modules(filter.as_deref()),
    }
    Ok(())
}

fn list_pipelines(filter: Option<&str>) {
    let loader = PipelineLoader::new(env::pipeline_dir());
    let mut infos = loader.list();
    if let Some(filter) = filter {
        infos.retain(|info| info.name.contains(filter));
    }
    if infos.is_empty() {
        println!("no pipelines found in {}", loader.dir().display());
        return;
    }
    for info in infos {
        match info.error {
            Some(error) => println!("{:<24} (error: {})", info.name, error),
            None => println!(
                "{:<24} {:>3} modules  {}",
                info.name, info.module_count, info.description
            ),
        }
    }
}

fn list_modules(filter: Option<&str>) {
    let discovery = ModuleDiscovery::new(
        env::module_dir(),
        std::sync::Arc::new(ModuleRegistry::new()),
        std::sync::Arc::new(NoInstaller),
    );
    let signers = TrustedSignerStore::load(env::trusted_signers_file());

    let mut modules = discovery.discover(None);
    if let Some(filter) = filter {
        modules.retain(|m| m.name.contains(filter) || m.manifest.name.contains(filter));
    }
    if modules.is_empty() {
        println!("no modules found in {}", discovery.base_dir().display());
        return;
    }
    for module in modules {
        let record = verify_module(&module.path, &signers);
        println!(
            "{:<24} v{:<10} {:<10} {}",
            module.manifest.name,
            module.manifest.version,
            record.status.to_string(),
            module.manifest.description
        );
    }
}
