// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level pipeline definition as read from a TOML file.
///
/// ```toml
/// [config]
/// model = "gpt-4o"
/// temperature = 0.1
///
/// [inputs]
/// requirements = "Build a campus event platform"
///
/// [role.architect]
/// title = "Senior System Architect"
/// goal = "Create a design document"
/// backstory = "An experienced system architect"
///
/// [task.design]
/// role = "architect"
/// description = "Analyse {requirements}"
/// expected_output = "A Markdown design document"
/// output_file = "DESIGN.md"
/// ```
///
/// This is the unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Generation and output settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Named values substituted into `{name}` placeholders.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,

    /// All roles from `[role.<id>]`.
    #[serde(default)]
    pub role: BTreeMap<String, RoleConfig>,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated pipeline definition.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on:
/// - every task's role exists
/// - every `after` entry names another existing task
/// - the task graph is acyclic
/// - every placeholder has a matching input
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub inputs: BTreeMap<String, String>,
    pub role: BTreeMap<String, RoleConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            inputs: raw.inputs,
            role: raw.role,
            task: raw.task,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Model identifier passed to the generation backend.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature, `0.0..=2.0`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional completion length cap; the backend default applies if unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory that artifacts are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Free text printed after a successful run.
    #[serde(default)]
    pub epilogue: Option<String>,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            output_dir: default_output_dir(),
            epilogue: None,
        }
    }
}

/// `[role.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// Human-facing role name, e.g. "Database Administrator".
    pub title: String,

    pub goal: String,

    pub backstory: String,

    /// Log full prompts and outputs for this role's tasks at debug level.
    #[serde(default)]
    pub verbose: bool,

    /// Carried for completeness; the sequential executor never delegates.
    #[serde(default)]
    pub allow_delegation: bool,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Identifier of the role that performs this task.
    pub role: String,

    /// Instruction text; may contain `{input}` placeholders.
    pub description: String,

    /// Description of the expected output, passed to the model as a hint.
    pub expected_output: String,

    /// Artifact name, relative to `[config].output_dir`.
    pub output_file: String,

    /// Prerequisite tasks, in the order their outputs are joined as context.
    #[serde(default)]
    pub after: Vec<String>,

    /// Remove a single Markdown code fence wrapping the whole output.
    #[serde(default)]
    pub strip_code_fences: bool,
}
