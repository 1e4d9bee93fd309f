// src/config/mod.rs

//! Pipeline definition loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk or the built-in one (`loader.rs`).
//! - Validate roles, dependencies, outputs and the DAG (`validate.rs`).
//! - Substitute `{input}` placeholders (`inputs.rs`).

pub mod inputs;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_default, load_from_path, parse_str, ConfigOverrides};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, RoleConfig, TaskConfig};
