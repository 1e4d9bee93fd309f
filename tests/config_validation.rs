// tests/config_validation.rs

use std::io::Write;

use tempfile::NamedTempFile;

use promptdag::config::{load_and_validate, load_default, ConfigFile, ConfigOverrides};
use promptdag::errors::PromptdagError;
use promptdag::pipeline::Pipeline;
use promptdag_test_utils::builders::{ConfigFileBuilder, RoleConfigBuilder, TaskConfigBuilder};

fn pipeline_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn expect_config_error(result: Result<ConfigFile, PromptdagError>, needle: &str) {
    match result {
        Err(PromptdagError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message '{}' lacks '{}'", msg, needle)
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = pipeline_file(
        r#"
[role.w]
title = "Writer"
goal = "write"
backstory = "writes"

[task.A]
role = "w"
description = "a"
expected_output = "a"
output_file = "a.md"
after = ["B"]

[task.B]
role = "w"
description = "b"
expected_output = "b"
output_file = "b.md"
after = ["A"]
"#,
    );

    match load_and_validate(Some(file.path()), &ConfigOverrides::default()) {
        Err(PromptdagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .with_task("A", TaskConfigBuilder::new("w", "a", "a.md").after("NonExistent").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "unknown dependency 'NonExistent'");
}

#[test]
fn unknown_role_returns_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .with_task("A", TaskConfigBuilder::new("ghost", "a", "a.md").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "unknown role 'ghost'");
}

#[test]
fn empty_pipeline_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "at least one");
}

#[test]
fn shared_output_file_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .with_task("A", TaskConfigBuilder::new("w", "a", "out.md").build())
        .with_task("B", TaskConfigBuilder::new("w", "b", "out.md").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "both write output_file 'out.md'");
}

#[test]
fn output_files_resolving_to_one_path_are_rejected() {
    for (first, second) in [
        ("a.md", "./a.md"),
        ("docs/a.md", "docs//a.md"),
        ("docs/a.md", "docs/./a.md"),
    ] {
        let raw = ConfigFileBuilder::new()
            .with_role("w", RoleConfigBuilder::new("Writer").build())
            .with_task("a", TaskConfigBuilder::new("w", "a", first).build())
            .with_task("b", TaskConfigBuilder::new("w", "b", second).after("a").build())
            .build_raw();

        expect_config_error(ConfigFile::try_from(raw), "both write output_file");
    }
}

#[test]
fn output_file_may_not_escape_output_dir() {
    for bad in ["../secrets.txt", "/etc/passwd", "docs/../../x.md"] {
        let raw = ConfigFileBuilder::new()
            .with_role("w", RoleConfigBuilder::new("Writer").build())
            .with_task("A", TaskConfigBuilder::new("w", "a", bad).build())
            .build_raw();
        expect_config_error(ConfigFile::try_from(raw), "relative path");
    }
}

#[test]
fn undefined_placeholder_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .with_task("A", TaskConfigBuilder::new("w", "Use {requirements}", "a.md").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "undefined input '{requirements}'");
}

#[test]
fn out_of_range_temperature_is_rejected() {
    let mut raw = ConfigFileBuilder::new()
        .with_role("w", RoleConfigBuilder::new("Writer").build())
        .with_task("A", TaskConfigBuilder::new("w", "a", "a.md").build())
        .build_raw();
    raw.config.temperature = 3.5;

    expect_config_error(ConfigFile::try_from(raw), "temperature");
}

#[test]
fn missing_file_is_a_config_error() {
    let result = load_and_validate(
        Some(std::path::Path::new("/definitely/not/here.toml")),
        &ConfigOverrides::default(),
    );
    expect_config_error(result, "reading pipeline file");
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = pipeline_file("[task.A\nrole = ");
    let result = load_and_validate(Some(file.path()), &ConfigOverrides::default());
    assert!(matches!(result, Err(PromptdagError::TomlError(_))));
}

#[test]
fn independent_tasks_from_toml_run_in_table_key_order() {
    let file = pipeline_file(
        r#"
[role.w]
title = "Writer"
goal = "write"
backstory = "writes"

[task.zeta]
role = "w"
description = "z"
expected_output = "z"
output_file = "z.md"

[task.alpha]
role = "w"
description = "a"
expected_output = "a"
output_file = "a.md"
"#,
    );

    let cfg = load_and_validate(Some(file.path()), &ConfigOverrides::default()).unwrap();
    let pipeline = Pipeline::from_config(&cfg).unwrap();

    let order: Vec<&str> = pipeline.execution_order().map(|t| t.id.as_str()).collect();
    assert_eq!(order, vec!["alpha", "zeta"]);
}

#[test]
fn builtin_pipeline_has_five_tasks_in_dependency_order() {
    let cfg = load_and_validate(None, &ConfigOverrides::default()).unwrap();
    let pipeline = Pipeline::from_config(&cfg).unwrap();

    let order: Vec<&str> = pipeline.execution_order().map(|t| t.id.as_str()).collect();
    assert_eq!(order, vec!["design", "schema", "api", "ui", "readme"]);

    let files: Vec<&str> = pipeline
        .execution_order()
        .map(|t| t.output_file.as_str())
        .collect();
    assert_eq!(
        files,
        vec!["DESIGN.md", "schema.sql", "main.py", "streamlit_app.py", "README.md"]
    );

    assert_eq!(pipeline.task("api").unwrap().after, vec!["design", "schema"]);
    assert_eq!(pipeline.task("readme").unwrap().after, vec!["api", "ui"]);
    assert_eq!(pipeline.roles().count(), 5);
    assert_eq!(cfg.config.model, "gpt-4o");
}

#[test]
fn builtin_pipeline_interpolates_requirements() {
    let cfg = load_and_validate(None, &ConfigOverrides::default()).unwrap();
    let pipeline = Pipeline::from_config(&cfg).unwrap();

    let design = pipeline.task("design").unwrap();
    assert!(!design.description.contains("{requirements}"));
    assert!(design.description.contains("Campus Event Management Platform"));
}

#[test]
fn overrides_replace_settings_and_inputs() {
    let overrides = ConfigOverrides {
        model: Some("gpt-4o-mini".to_string()),
        temperature: Some(0.7),
        api_base: None,
        output_dir: Some("generated".to_string()),
        inputs: vec![("requirements".to_string(), "Build a library catalogue.".to_string())],
    };

    let cfg = load_and_validate(None, &overrides).unwrap();
    assert_eq!(cfg.config.model, "gpt-4o-mini");
    assert_eq!(cfg.config.temperature, 0.7);
    assert_eq!(cfg.config.output_dir, "generated");

    let pipeline = Pipeline::from_config(&cfg).unwrap();
    assert!(pipeline
        .task("design")
        .unwrap()
        .description
        .contains("Build a library catalogue."));
}

#[test]
fn raw_default_is_parseable_without_validation() {
    let raw = load_default().unwrap();
    assert_eq!(raw.task.len(), 5);
    assert!(raw.inputs.contains_key("requirements"));
    assert!(raw.config.epilogue.is_some());
}
