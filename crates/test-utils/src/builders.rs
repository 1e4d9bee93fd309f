use std::collections::BTreeMap;
use promptdag::config::{ConfigFile, ConfigSection, RawConfigFile, RoleConfig, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                inputs: BTreeMap::new(),
                role: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_role(mut self, id: &str, role: RoleConfig) -> Self {
        self.config.role.insert(id.to_string(), role);
        self
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.config.task.insert(id.to_string(), task);
        self
    }

    pub fn with_input(mut self, key: &str, value: &str) -> Self {
        self.config.inputs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.config.model = model.to_string();
        self
    }

    pub fn with_output_dir(mut self, dir: &str) -> Self {
        self.config.config.output_dir = dir.to_string();
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RoleConfig`.
pub struct RoleConfigBuilder {
    role: RoleConfig,
}

impl RoleConfigBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            role: RoleConfig {
                title: title.to_string(),
                goal: format!("Do the work of a {title}"),
                backstory: format!("A seasoned {title}"),
                verbose: false,
                allow_delegation: false,
            },
        }
    }

    pub fn goal(mut self, goal: &str) -> Self {
        self.role.goal = goal.to_string();
        self
    }

    pub fn backstory(mut self, backstory: &str) -> Self {
        self.role.backstory = backstory.to_string();
        self
    }

    pub fn verbose(mut self, val: bool) -> Self {
        self.role.verbose = val;
        self
    }

    pub fn build(self) -> RoleConfig {
        self.role
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(role: &str, description: &str, output_file: &str) -> Self {
        Self {
            task: TaskConfig {
                role: role.to_string(),
                description: description.to_string(),
                expected_output: String::new(),
                output_file: output_file.to_string(),
                after: vec![],
                strip_code_fences: false,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn expected_output(mut self, text: &str) -> Self {
        self.task.expected_output = text.to_string();
        self
    }

    pub fn strip_code_fences(mut self, val: bool) -> Self {
        self.task.strip_code_fences = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
