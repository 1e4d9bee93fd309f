// src/config/validate.rs

use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::artifact::artifact_key;
use crate::config::inputs::placeholders;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PromptdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PromptdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_roles(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_output_files(cfg)?;
    validate_placeholders(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> PromptdagError {
    PromptdagError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "pipeline must contain at least one [task.<id>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    if c.model.trim().is_empty() {
        return Err(config_error("[config].model must not be empty"));
    }
    if !(0.0..=2.0).contains(&c.temperature) {
        return Err(config_error(format!(
            "[config].temperature must be within 0.0..=2.0 (got {})",
            c.temperature
        )));
    }
    if c.max_tokens == Some(0) {
        return Err(config_error("[config].max_tokens must be >= 1 (got 0)"));
    }
    if c.request_timeout_secs == 0 {
        return Err(config_error(
            "[config].request_timeout_secs must be >= 1 (got 0)",
        ));
    }
    if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
        return Err(config_error(format!(
            "[config].api_base must be an http(s) URL (got '{}')",
            c.api_base
        )));
    }

    Ok(())
}

fn validate_task_roles(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if !cfg.role.contains_key(&task.role) {
            return Err(config_error(format!(
                "task '{}' is assigned unknown role '{}'",
                name, task.role
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (idx, dep) in task.after.iter().enumerate() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if task.after[..idx].contains(dep) {
                return Err(config_error(format!(
                    "task '{}' lists dependency '{}' more than once in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_output_files(cfg: &RawConfigFile) -> Result<()> {
    // Keyed by normalised path so `a.md` and `./a.md` collide.
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();

    for (name, task) in cfg.task.iter() {
        let file = task.output_file.as_str();

        if file.trim().is_empty() {
            return Err(config_error(format!(
                "task '{}' has an empty `output_file`",
                name
            )));
        }
        let Some(key) = artifact_key(file) else {
            return Err(config_error(format!(
                "task '{}' output_file '{}' must be a relative path inside the output directory",
                name, file
            )));
        };
        if let Some(other) = seen.insert(key.clone(), name.as_str()) {
            return Err(config_error(format!(
                "tasks '{}' and '{}' both write output_file '{}'",
                other,
                name,
                key.display()
            )));
        }
    }
    Ok(())
}

fn validate_placeholders(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let texts = [
            ("description", &task.description),
            ("expected_output", &task.expected_output),
        ];
        for (field, text) in texts {
            if let Some(missing) = placeholders(text)
                .into_iter()
                .find(|p| !cfg.inputs.contains_key(p))
            {
                return Err(config_error(format!(
                    "task '{}' {} references undefined input '{{{}}}'",
                    name, field, missing
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task, so `[task.B] after = ["A"]` adds A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PromptdagError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}
