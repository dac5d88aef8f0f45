// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wraith run` and `wraith validate`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use indexmap::IndexMap;
use tracing::info;

use wr_bus::{MessageBus, TypeTranslator};
use wr_core::{parse_duration, Value};
use wr_engine::{env, Collaborators, CommandInstaller, Engine, EngineOptions, Installer,
    ModuleRegistry, NoInstaller, RunOutcome,
};
use wr_pipeline::PipelineLoader;
use wr_signing::{SecurityMode, TrustedSignerStore};

use crate::exit_error::ExitError;
use crate::prompt::TerminalPrompt;

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline name (resolved under the pipeline directory)
    pub pipeline: String,

    /// Module setting override, `id.key=value`; repeatable, wins over
    /// pipeline config
    #[arg(long = "set", value_name = "ID.KEY=VALUE")]
    pub set: Vec<String>,

    /// Validate the configuration without executing modules
    #[arg(long)]
    pub dry_run: bool,

    /// Hard wall-clock limit (seconds or a duration string)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<String>,

    /// Write the validation report to a file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Module verification strictness
    #[arg(long, value_name = "MODE", default_value = "default")]
    pub security_mode: String,

    /// Run unverified modules without prompting
    #[arg(long)]
    pub allow_unverified: bool,

    /// Proceed despite validation errors
    #[arg(long = "force")]
    pub ignore_warnings: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Pipeline name (resolved under the pipeline directory)
    pub pipeline: String,

    /// Write the validation report to a file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub async fn run(args: RunArgs) -> Result<(), ExitError> {
    let options = build_options(&args)?;
    let engine = Engine::new(options, collaborators());

    let report = engine
        .start()
        .await
        .map_err(|err| ExitError::new(1, err.to_string()))?;

    match report.outcome {
        RunOutcome::Validated => println!("validation passed"),
        RunOutcome::ValidationFailed => {
            for message in &report.validation_errors {
                eprintln!("  - {}", message);
            }
        }
        RunOutcome::NoModules => println!("partial / no modules to run"),
        RunOutcome::Completed | RunOutcome::TimedOut => {
            info!(
                pipeline = %report.pipeline,
                modules = report.modules_run.len(),
                excluded = report.excluded.len(),
                "run finished"
            );
        }
    }
    for (module, status) in &report.excluded {
        eprintln!("excluded: {} ({})", module, status);
    }

    if report.outcome.success() {
        Ok(())
    } else {
        Err(ExitError::silent(1))
    }
}

pub async fn validate(args: ValidateArgs) -> Result<(), ExitError> {
    run(RunArgs {
        pipeline: args.pipeline,
        set: vec![],
        dry_run: true,
        timeout: None,
        output: args.output,
        security_mode: "permissive".to_string(),
        allow_unverified: false,
        ignore_warnings: false,
    })
    .await
}

fn build_options(args: &RunArgs) -> Result<EngineOptions, ExitError> {
    let mut options = EngineOptions::new(&args.pipeline);
    options.dry_run = args.dry_run;
    options.output = args.output.clone();
    options.allow_unverified = args.allow_unverified;
    options.ignore_warnings = args.ignore_warnings;
    options.security_mode = args
        .security_mode
        .parse::<SecurityMode>()
        .map_err(|err| ExitError::new(1, err))?;
    if let Some(raw) = &args.timeout {
        options.timeout = Some(
            parse_duration(raw)
                .ok_or_else(|| ExitError::new(1, format!("invalid timeout: {}", raw)))?,
        );
    }
    options.module_settings = parse_module_settings(&args.set)?;
    Ok(options)
}

/// Parse repeated `--set id.key=value` flags.
fn parse_module_settings(
    entries: &[String],
) -> Result<HashMap<String, IndexMap<String, Value>>, ExitError> {
    let mut settings: HashMap<String, IndexMap<String, Value>> = HashMap::new();
    for entry in entries {
        let (target, value) = entry.split_once('=').ok_or_else(|| {
            ExitError::new(1, format!("invalid --set '{}', expected id.key=value", entry))
        })?;
        let (id, key) = target.split_once('.').ok_or_else(|| {
            ExitError::new(1, format!("invalid --set '{}', expected id.key=value", entry))
        })?;
        settings
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), Value::from(value));
    }
    Ok(settings)
}

/// Wire the engine's collaborators from the environment: pipeline and
/// module directories, the trusted-signer store, the translation rules,
/// and the optional external package manager.
fn collaborators() -> Collaborators {
    let translator = TypeTranslator::with_rules_file(&env::translation_rules_file());
    Collaborators {
        loader: PipelineLoader::new(env::pipeline_dir()),
        module_dir: env::module_dir(),
        // Embedders register their module factories here before starting
        // the engine; the stock binary ships none.
        registry: Arc::new(ModuleRegistry::new()),
        installer: installer(),
        signers: TrustedSignerStore::load(env::trusted_signers_file()),
        prompt: Arc::new(TerminalPrompt),
        bus: Arc::new(MessageBus::with_translator(translator)),
    }
}

/// `WRAITH_INSTALLER="cargo install"` delegates requirement installation
/// to an external command; unset means requirements are assumed present.
fn installer() -> Arc<dyn Installer> {
    match std::env::var("WRAITH_INSTALLER") {
        Ok(command) if !command.trim().is_empty() => {
            let mut parts = command.split_whitespace();
            let program = parts.next().unwrap_or_default().to_string();
            let args: Vec<&str> = parts.collect();
            Arc::new(CommandInstaller::new(&program, &args, vec![]))
        }
        _ => Arc::new(NoInstaller),
    }
}
