// src/pipeline/context.rs

//! Context resolution: the prerequisite outputs a task is given to work with.

use crate::errors::{PromptdagError, Result};
use crate::pipeline::model::Task;
use crate::pipeline::results::ResultsStore;

/// Concatenate the result text of every prerequisite of `task`, in the order
/// listed in `task.after`.
///
/// Fails with [`PromptdagError::MissingDependencyResult`] on the first
/// prerequisite that has no result yet; no partial context is returned.
pub fn resolve_context(task: &Task, results: &ResultsStore) -> Result<String> {
    let mut context = String::new();

    for dep in task.after.iter() {
        let result = results
            .get(dep)
            .ok_or_else(|| PromptdagError::MissingDependencyResult {
                task: task.id.clone(),
                dependency: dep.clone(),
            })?;
        context.push_str(&result.text);
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::pipeline::model::TaskResult;

    fn store(entries: &[(&str, &str)]) -> ResultsStore {
        let mut store = ResultsStore::new();
        for (task, text) in entries {
            store.insert(TaskResult {
                task: task.to_string(),
                text: text.to_string(),
                artifact: PathBuf::from(task),
            });
        }
        store
    }

    #[test]
    fn no_prerequisites_means_empty_context() {
        let task = Task::new("t", "r", "x", "t.md");
        assert_eq!(resolve_context(&task, &ResultsStore::new()).unwrap(), "");
    }

    #[test]
    fn follows_listed_order_not_completion_order() {
        let results = store(&[("t2", "second"), ("t1", "first")]);
        let task = Task::new("t3", "r", "x", "t3.md").after("t1").after("t2");
        assert_eq!(resolve_context(&task, &results).unwrap(), "firstsecond");

        let reversed = Task::new("t4", "r", "x", "t4.md").after("t2").after("t1");
        assert_eq!(resolve_context(&reversed, &results).unwrap(), "secondfirst");
    }

    #[test]
    fn missing_prerequisite_fails() {
        let results = store(&[("t1", "first")]);
        let task = Task::new("t3", "r", "x", "t3.md").after("t1").after("t2");
        match resolve_context(&task, &results) {
            Err(PromptdagError::MissingDependencyResult { task, dependency }) => {
                assert_eq!(task, "t3");
                assert_eq!(dependency, "t2");
            }
            other => panic!("expected MissingDependencyResult, got {:?}", other),
        }
    }
}
