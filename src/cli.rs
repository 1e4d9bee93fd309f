// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `promptdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "promptdag",
    version,
    about = "Run a dependency-ordered pipeline of LLM role prompts and write each result to a file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a pipeline definition (TOML).
    ///
    /// Default: the built-in campus event system pipeline.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Directory to write artifacts into (overrides `[config].output_dir`).
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Model identifier (overrides `OPENAI_MODEL_NAME` and `[config].model`).
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Sampling temperature (overrides `[config].temperature`).
    #[arg(long, value_name = "FLOAT")]
    pub temperature: Option<f32>,

    /// Set an input value, e.g. `--input requirements="..."`. Repeatable.
    #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub inputs: Vec<(String, String)>,

    /// Set an input value from a file's contents. Repeatable.
    #[arg(long = "input-file", value_name = "KEY=PATH", value_parser = parse_key_value)]
    pub input_files: Vec<(String, String)>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROMPTDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the pipeline and print the execution plan without calling
    /// the model or writing files.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
