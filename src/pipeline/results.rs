// src/pipeline/results.rs

use std::collections::HashMap;

use crate::pipeline::model::{TaskId, TaskResult};

/// Results of one pipeline run, keyed by task and remembering completion
/// order.
///
/// Entries are write-once: a second result for the same task is refused.
#[derive(Debug, Clone, Default)]
pub struct ResultsStore {
    by_task: HashMap<TaskId, TaskResult>,
    completed: Vec<TaskId>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `result`. Returns `false` (leaving the existing entry alone) if
    /// the task already has a result.
    pub fn insert(&mut self, result: TaskResult) -> bool {
        if self.by_task.contains_key(&result.task) {
            return false;
        }
        self.completed.push(result.task.clone());
        self.by_task.insert(result.task.clone(), result);
        true
    }

    pub fn get(&self, task: &str) -> Option<&TaskResult> {
        self.by_task.get(task)
    }

    pub fn contains(&self, task: &str) -> bool {
        self.by_task.contains_key(task)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Task identifiers in the order their results were stored.
    pub fn completion_order(&self) -> &[TaskId] {
        &self.completed
    }

    /// Results in completion order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskResult> {
        self.completed.iter().filter_map(|id| self.by_task.get(id))
    }

    /// The most recently stored result.
    pub fn last(&self) -> Option<&TaskResult> {
        self.completed.last().and_then(|id| self.by_task.get(id))
    }

    pub(crate) fn clear(&mut self) {
        self.by_task.clear();
        self.completed.clear();
    }
}
