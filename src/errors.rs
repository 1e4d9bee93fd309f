// src/errors.rs

//! Crate-wide error types.
//!
//! Every variant is fatal to a pipeline run; nothing is recovered locally.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::TaskId;

#[derive(Error, Debug)]
pub enum PromptdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("task '{task}' ran before its prerequisite '{dependency}' produced a result")]
    MissingDependencyResult { task: TaskId, dependency: TaskId },

    #[error("generation failed for task '{task}': {source}")]
    Generation {
        task: TaskId,
        #[source]
        source: GenerationError,
    },

    #[error("writing artifact {path:?} for task '{task}' failed: {source}")]
    ArtifactWrite {
        task: TaskId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Failures of the external text-generation capability.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("authentication rejected (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("quota exhausted or rate limited (HTTP {status}): {body}")]
    QuotaExceeded { status: u16, body: String },

    #[error("generation backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response was filtered: {0}")]
    Filtered(String),

    #[error("generation returned empty output")]
    EmptyOutput,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_decode() {
            GenerationError::Malformed(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PromptdagError>;
