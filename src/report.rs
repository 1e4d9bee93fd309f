// src/report.rs

//! Console output for dry runs and finished runs.
//!
//! Everything here writes to a caller-supplied writer so it can be tested;
//! `lib.rs` passes stdout.

use std::io::{self, Write};

use crate::config::model::ConfigSection;
use crate::pipeline::{Pipeline, RunReport};

const RULE: &str = "----------------------------------------------------------------";

/// Print the execution plan: settings, then tasks in execution order.
pub fn print_dry_run(out: &mut impl Write, cfg: &ConfigSection, pipeline: &Pipeline) -> io::Result<()> {
    writeln!(out, "promptdag dry-run")?;
    writeln!(out, "  config.model = {}", cfg.model)?;
    writeln!(out, "  config.temperature = {}", cfg.temperature)?;
    if let Some(max_tokens) = cfg.max_tokens {
        writeln!(out, "  config.max_tokens = {max_tokens}")?;
    }
    writeln!(out, "  config.api_base = {}", cfg.api_base)?;
    writeln!(out, "  config.output_dir = {}", cfg.output_dir)?;
    writeln!(out)?;

    writeln!(out, "execution order ({} tasks):", pipeline.len())?;
    for (step, task) in pipeline.execution_order().enumerate() {
        writeln!(out, "  {}. {}", step + 1, task.id)?;
        match pipeline.role_for(task) {
            Some(role) => writeln!(out, "      role: {} ({})", task.role, role.title)?,
            None => writeln!(out, "      role: {}", task.role)?,
        }
        if !task.after.is_empty() {
            writeln!(out, "      after: {:?}", task.after)?;
        }
        writeln!(out, "      output_file: {}", task.output_file)?;
        if task.strip_code_fences {
            writeln!(out, "      strip_code_fences: true")?;
        }
        writeln!(out, "      description: {} chars", task.description.trim().len())?;
    }

    Ok(())
}

/// Print the banner shown before the first task starts.
pub fn print_run_header(out: &mut impl Write, model: &str, pipeline: &Pipeline) -> io::Result<()> {
    writeln!(out, "## promptdag: {} tasks, model {} ##", pipeline.len(), model)?;
    let order: Vec<&str> = pipeline.execution_order().map(|t| t.id.as_str()).collect();
    writeln!(out, "execution order: {}", order.join(" -> "))?;
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Print the outcome of a successful run.
pub fn print_run_summary(
    out: &mut impl Write,
    report: &RunReport,
    epilogue: Option<&str>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "## Pipeline finished ##")?;
    writeln!(out)?;

    if let Some(result) = report.final_result() {
        writeln!(out, "Final result ({}):", result.task)?;
        writeln!(out, "{}", result.text.trim_end())?;
        writeln!(out)?;
    }

    writeln!(out, "Generated files:")?;
    for result in report.results.iter() {
        writeln!(out, "  - {} ({})", result.artifact.display(), result.task)?;
    }

    if let Some(text) = epilogue {
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "{}", text.trim_end())?;
    }

    Ok(())
}
