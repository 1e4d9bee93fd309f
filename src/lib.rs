// src/lib.rs

pub mod artifact;
pub mod cli;
pub mod config;
pub mod errors;
pub mod generate;
pub mod logging;
pub mod pipeline;
pub mod report;

use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::artifact::DirArtifactStore;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigOverrides};
use crate::errors::{PromptdagError, Result};
use crate::generate::{GenerationOptions, OpenAiGenerator};
use crate::pipeline::{Pipeline, SequentialExecutor};

/// Overrides the model when set and no `--model` flag is given.
pub const MODEL_ENV: &str = "OPENAI_MODEL_NAME";

/// Overrides `[config].api_base` when set.
pub const API_BASE_ENV: &str = "OPENAI_API_BASE";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading, overrides and validation
/// - the OpenAI generator (credentials checked before any task runs)
/// - the artifact directory
/// - the sequential executor and console report
pub async fn run(args: CliArgs) -> Result<()> {
    let overrides = build_overrides(&args)?;
    let cfg = load_and_validate(args.config.as_deref().map(Path::new), &overrides)?;
    let pipeline = Pipeline::from_config(&cfg)?;

    match args.config.as_deref() {
        Some(path) => info!(path, tasks = pipeline.len(), "pipeline loaded"),
        None => info!(tasks = pipeline.len(), "using built-in pipeline"),
    }

    let mut stdout = std::io::stdout();

    if args.dry_run {
        report::print_dry_run(&mut stdout, &cfg.config, &pipeline)?;
        debug!("dry-run complete (no generation)");
        return Ok(());
    }

    let generator = OpenAiGenerator::from_env(
        &cfg.config.api_base,
        Duration::from_secs(cfg.config.request_timeout_secs),
    )?;
    info!(api_base = %cfg.config.api_base, model = %cfg.config.model, "generator initialised");

    let store = DirArtifactStore::new(&cfg.config.output_dir);
    let options = GenerationOptions::from(&cfg.config);

    report::print_run_header(&mut stdout, &options.model, &pipeline)?;

    let mut executor = SequentialExecutor::new(generator, store, options);
    let report = executor.run(&pipeline).await?;

    report::print_run_summary(&mut stdout, &report, cfg.config.epilogue.as_deref())?;
    Ok(())
}

/// Merge environment and CLI settings; CLI wins.
fn build_overrides(args: &CliArgs) -> Result<ConfigOverrides> {
    let mut overrides = ConfigOverrides {
        model: args.model.clone().or_else(|| non_empty_env(MODEL_ENV)),
        temperature: args.temperature,
        api_base: non_empty_env(API_BASE_ENV),
        output_dir: args.output_dir.clone(),
        inputs: Vec::new(),
    };

    for (key, path) in args.input_files.iter() {
        let value = fs::read_to_string(path).map_err(|e| {
            PromptdagError::ConfigError(format!("reading input '{}' from {:?}: {}", key, path, e))
        })?;
        overrides.inputs.push((key.clone(), value));
    }
    overrides.inputs.extend(args.inputs.iter().cloned());

    Ok(overrides)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
