// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PromptdagError, Result};

/// The campus event system pipeline shipped with the binary.
pub const DEFAULT_PIPELINE_TOML: &str = include_str!("../../pipelines/campus_events.toml");

/// Settings layered on top of a loaded pipeline before validation.
///
/// `None` / empty fields leave the file's values alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub api_base: Option<String>,
    pub output_dir: Option<String>,
    /// Input values; later entries win over earlier ones and over the file.
    pub inputs: Vec<(String, String)>,
}

impl RawConfigFile {
    /// Apply overrides in place.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref model) = overrides.model {
            self.config.model = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.config.temperature = temperature;
        }
        if let Some(ref api_base) = overrides.api_base {
            self.config.api_base = api_base.clone();
        }
        if let Some(ref output_dir) = overrides.output_dir {
            self.config.output_dir = output_dir.clone();
        }
        for (key, value) in overrides.inputs.iter() {
            self.inputs.insert(key.clone(), value.clone());
        }
    }
}

/// Parse a pipeline definition from TOML text without semantic validation.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a pipeline file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (DAG correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        PromptdagError::ConfigError(format!("reading pipeline file at {:?}: {}", path, e))
    })?;
    parse_str(&contents)
}

/// The built-in pipeline, unvalidated.
pub fn load_default() -> Result<RawConfigFile> {
    parse_str(DEFAULT_PIPELINE_TOML)
}

/// Load a pipeline (from `path`, or the built-in one), apply overrides and
/// validate.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ConfigFile> {
    let mut raw = match path {
        Some(p) => load_from_path(p)?,
        None => load_default()?,
    };
    raw.apply_overrides(overrides);
    ConfigFile::try_from(raw)
}
