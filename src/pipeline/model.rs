// src/pipeline/model.rs

//! Immutable role and task records, and the validated [`Pipeline`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use crate::artifact::artifact_key;
use crate::config::inputs::interpolate;
use crate::config::model::ConfigFile;
use crate::errors::{PromptdagError, Result};
use crate::pipeline::graph::DagGraph;

/// Canonical task identifier type.
pub type TaskId = String;

/// Canonical role identifier type.
pub type RoleId = String;

/// A persona applied when generating text for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    pub goal: String,
    pub backstory: String,
    pub verbose: bool,
    pub allow_delegation: bool,
}

impl Role {
    pub fn new(
        id: impl Into<RoleId>,
        title: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            verbose: false,
            allow_delegation: false,
        }
    }
}

/// A unit of work: one generation call, one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub expected_output: String,
    pub role: RoleId,
    /// Prerequisites, in the order their results are joined as context.
    pub after: Vec<TaskId>,
    pub output_file: String,
    pub strip_code_fences: bool,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        role: impl Into<RoleId>,
        description: impl Into<String>,
        output_file: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: String::new(),
            role: role.into(),
            after: Vec::new(),
            output_file: output_file.into(),
            strip_code_fences: false,
        }
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    pub fn after(mut self, dep: impl Into<TaskId>) -> Self {
        self.after.push(dep.into());
        self
    }

    pub fn with_strip_code_fences(mut self, strip: bool) -> Self {
        self.strip_code_fences = strip;
        self
    }
}

/// The output of one successfully executed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub task: TaskId,
    pub text: String,
    /// Where the text was persisted.
    pub artifact: PathBuf,
}

/// A validated, dependency-ordered set of tasks and the roles they use.
///
/// Construction guarantees:
/// - task identifiers are unique
/// - every task's role is present
/// - every prerequisite names another task in the same pipeline
/// - no two tasks write the same artifact
/// - the dependency graph is acyclic
#[derive(Debug, Clone)]
pub struct Pipeline {
    roles: BTreeMap<RoleId, Role>,
    tasks: Vec<Task>,
    graph: DagGraph,
    /// Indices into `tasks`, in execution order.
    order: Vec<usize>,
}

impl Pipeline {
    /// Build a pipeline from roles and tasks in declaration order.
    ///
    /// Declaration order only breaks ties between tasks that are ready at the
    /// same time; it is never assumed to be a valid execution order.
    pub fn new(roles: Vec<Role>, tasks: Vec<Task>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(PromptdagError::ConfigError(
                "pipeline must contain at least one task".to_string(),
            ));
        }

        let mut role_map = BTreeMap::new();
        for role in roles {
            if role_map.contains_key(&role.id) {
                return Err(PromptdagError::ConfigError(format!(
                    "duplicate role '{}'",
                    role.id
                )));
            }
            role_map.insert(role.id.clone(), role);
        }

        let mut seen = HashSet::new();
        let mut outputs: HashMap<PathBuf, &str> = HashMap::new();
        for task in tasks.iter() {
            if !seen.insert(task.id.as_str()) {
                return Err(PromptdagError::ConfigError(format!(
                    "duplicate task '{}'",
                    task.id
                )));
            }
            if !role_map.contains_key(&task.role) {
                return Err(PromptdagError::ConfigError(format!(
                    "task '{}' is assigned unknown role '{}'",
                    task.id, task.role
                )));
            }
            let key = artifact_key(&task.output_file).ok_or_else(|| {
                PromptdagError::ConfigError(format!(
                    "task '{}' output_file '{}' must be a relative path inside the output directory",
                    task.id, task.output_file
                ))
            })?;
            if let Some(other) = outputs.insert(key, task.id.as_str()) {
                return Err(PromptdagError::ConfigError(format!(
                    "tasks '{}' and '{}' both write output_file '{}'",
                    other, task.id, task.output_file
                )));
            }
        }

        let graph = DagGraph::from_tasks(&tasks)?;
        let order = graph.topological_order()?;

        Ok(Self {
            roles: role_map,
            tasks,
            graph,
            order,
        })
    }

    /// Build a pipeline from a validated [`ConfigFile`], substituting
    /// `[inputs]` into task text.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let roles = cfg
            .role
            .iter()
            .map(|(id, rc)| Role {
                id: id.clone(),
                title: rc.title.clone(),
                goal: rc.goal.clone(),
                backstory: rc.backstory.clone(),
                verbose: rc.verbose,
                allow_delegation: rc.allow_delegation,
            })
            .collect();

        let tasks = cfg
            .task
            .iter()
            .map(|(id, tc)| Task {
                id: id.clone(),
                description: interpolate(&tc.description, &cfg.inputs),
                expected_output: interpolate(&tc.expected_output, &cfg.inputs),
                role: tc.role.clone(),
                after: tc.after.clone(),
                output_file: tc.output_file.clone(),
                strip_code_fences: tc.strip_code_fences,
            })
            .collect();

        Self::new(roles, tasks)
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Role assigned to `task`. Always present for tasks of this pipeline.
    pub fn role_for(&self, task: &Task) -> Option<&Role> {
        self.roles.get(&task.role)
    }

    /// Tasks in the order the executor will run them.
    pub fn execution_order(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().map(|&idx| &self.tasks[idx])
    }

    /// Tasks that list `id` as a prerequisite.
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.graph.dependents_of(id)
    }

    /// The task whose result is reported as the pipeline output.
    pub fn final_task(&self) -> Option<&Task> {
        self.order.last().map(|&idx| &self.tasks[idx])
    }
}
