// src/pipeline/executor.rs

//! Sequential executor.
//!
//! Runs every task of a [`Pipeline`] exactly once, in topological order, one
//! generation call at a time. The first failure of any kind ends the run;
//! there is no retry and no resumption.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::artifact::{strip_code_fences, ArtifactStore};
use crate::errors::{GenerationError, PromptdagError, Result};
use crate::generate::{GenerationOptions, GenerationRequest, Generator};
use crate::pipeline::context::resolve_context;
use crate::pipeline::model::{Pipeline, Task, TaskId, TaskResult};
use crate::pipeline::prompt::{build_prompt, persona};
use crate::pipeline::results::ResultsStore;

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    NotRun,
    Running,
    Completed,
    Failed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Task identifiers in the order they were executed.
    pub order: Vec<TaskId>,
    pub results: ResultsStore,
}

impl RunReport {
    /// The result of the last executed task, reported as the pipeline output.
    pub fn final_result(&self) -> Option<&TaskResult> {
        self.order.last().and_then(|id| self.results.get(id))
    }
}

/// Drives a pipeline through a [`Generator`] and persists results through an
/// [`ArtifactStore`].
///
/// State from the latest run (per-task states and stored results) stays
/// inspectable after `run` returns, including after a failure.
pub struct SequentialExecutor<G: Generator, S: ArtifactStore> {
    generator: G,
    store: S,
    options: GenerationOptions,
    states: HashMap<TaskId, TaskRunState>,
    results: ResultsStore,
}

impl<G: Generator, S: ArtifactStore> fmt::Debug for SequentialExecutor<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialExecutor")
            .field("store", &self.store)
            .field("options", &self.options)
            .field("states", &self.states)
            .field("completed", &self.results.completion_order())
            .finish_non_exhaustive()
    }
}

impl<G: Generator, S: ArtifactStore> SequentialExecutor<G, S> {
    pub fn new(generator: G, store: S, options: GenerationOptions) -> Self {
        Self {
            generator,
            store,
            options,
            states: HashMap::new(),
            results: ResultsStore::new(),
        }
    }

    /// Results stored by the latest run.
    pub fn results(&self) -> &ResultsStore {
        &self.results
    }

    /// State of `task` in the latest run; `None` for tasks never seen.
    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.states.get(task).copied()
    }

    /// Execute the whole pipeline.
    ///
    /// Any previous run's state is discarded first. On error, results of the
    /// tasks that completed before the failure remain in [`Self::results`].
    pub async fn run(&mut self, pipeline: &Pipeline) -> Result<RunReport> {
        self.results.clear();
        self.states = pipeline
            .tasks()
            .iter()
            .map(|t| (t.id.clone(), TaskRunState::NotRun))
            .collect();

        let total = pipeline.len();
        info!(tasks = total, model = %self.options.model, "pipeline run started");

        let mut order = Vec::with_capacity(total);

        for (step, task) in pipeline.execution_order().enumerate() {
            self.states.insert(task.id.clone(), TaskRunState::Running);
            info!(
                task = %task.id,
                role = %task.role,
                step = step + 1,
                total,
                "running task"
            );

            match self.run_task(pipeline, task).await {
                Ok(result) => {
                    info!(
                        task = %task.id,
                        artifact = %result.artifact.display(),
                        chars = result.text.len(),
                        "task completed"
                    );
                    let inserted = self.results.insert(result);
                    debug_assert!(inserted, "task '{}' produced a second result", task.id);
                    self.states.insert(task.id.clone(), TaskRunState::Completed);
                    order.push(task.id.clone());
                }
                Err(err) => {
                    error!(task = %task.id, error = %err, "task failed; aborting pipeline run");
                    self.states.insert(task.id.clone(), TaskRunState::Failed);
                    return Err(err);
                }
            }
        }

        info!(tasks = order.len(), "pipeline run finished");

        Ok(RunReport {
            order,
            results: self.results.clone(),
        })
    }

    async fn run_task(&self, pipeline: &Pipeline, task: &Task) -> Result<TaskResult> {
        let context = resolve_context(task, &self.results)?;

        let role = pipeline
            .role_for(task)
            .ok_or_else(|| PromptdagError::ConfigError(format!(
                "task '{}' is assigned unknown role '{}'",
                task.id, task.role
            )))?;

        let request = GenerationRequest {
            task: task.id.clone(),
            persona: persona(role),
            prompt: build_prompt(task, &context),
            expected_output: task.expected_output.clone(),
            options: self.options.clone(),
        };

        if role.verbose {
            debug!(task = %task.id, persona = %request.persona, prompt = %request.prompt, "prompt");
        }

        let generated = self
            .generator
            .generate(&request)
            .await
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationError::EmptyOutput)
                } else {
                    Ok(text)
                }
            })
            .map_err(|source| PromptdagError::Generation {
                task: task.id.clone(),
                source,
            })?;

        let text = if task.strip_code_fences {
            let stripped = strip_code_fences(&generated);
            if stripped.len() != generated.len() {
                debug!(task = %task.id, "removed wrapping code fence from output");
            }
            stripped
        } else {
            generated
        };

        if role.verbose {
            debug!(task = %task.id, output = %text, "generated output");
        }

        let artifact = self
            .store
            .write(&task.output_file, &text)
            .map_err(|source| {
                warn!(task = %task.id, file = %task.output_file, "artifact write failed");
                PromptdagError::ArtifactWrite {
                    task: task.id.clone(),
                    path: self.store.location(&task.output_file),
                    source,
                }
            })?;

        Ok(TaskResult {
            task: task.id.clone(),
            text,
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::artifact::MemoryArtifactStore;
    use crate::generate::GenerateFuture;
    use crate::pipeline::model::Role;

    /// Answers `"<task>-out"` and remembers the prompts it saw.
    #[derive(Default)]
    struct EchoGenerator {
        prompts: Mutex<Vec<(String, String)>>,
        fail_on: Option<String>,
        reply: Option<String>,
    }

    impl Generator for EchoGenerator {
        fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
            Box::pin(async move {
                self.prompts
                    .lock()
                    .unwrap()
                    .push((request.task.clone(), request.prompt.clone()));
                if self.fail_on.as_deref() == Some(request.task.as_str()) {
                    return Err(GenerationError::Timeout);
                }
                Ok(self
                    .reply
                    .clone()
                    .unwrap_or_else(|| format!("{}-out", request.task)))
            })
        }
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    async fn run_logged(role: Role) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let pipeline = Pipeline::new(
            vec![role],
            vec![Task::new("spec", "r", "Describe the widget registry.", "spec.md")],
        )
        .unwrap();
        let generator = EchoGenerator {
            reply: Some("registry notes".to_string()),
            ..Default::default()
        };
        let mut exec =
            SequentialExecutor::new(generator, MemoryArtifactStore::new(), GenerationOptions::default());
        exec.run(&pipeline).await.unwrap();

        logs.text()
    }

    fn chain() -> Pipeline {
        Pipeline::new(
            vec![Role::new("r", "Writer", "Write", "Writes")],
            vec![
                Task::new("b", "r", "second", "b.md").after("a"),
                Task::new("a", "r", "first", "a.md"),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn states_track_the_run() {
        let mut exec = SequentialExecutor::new(
            EchoGenerator::default(),
            MemoryArtifactStore::new(),
            GenerationOptions::default(),
        );
        let report = exec.run(&chain()).await.unwrap();

        assert_eq!(report.order, vec!["a", "b"]);
        assert_eq!(report.final_result().unwrap().text, "b-out");
        assert_eq!(exec.state_of("a"), Some(TaskRunState::Completed));
        assert_eq!(exec.state_of("b"), Some(TaskRunState::Completed));
        assert_eq!(exec.state_of("zzz"), None);
    }

    #[tokio::test]
    async fn failure_marks_task_failed_and_later_tasks_not_run() {
        let generator = EchoGenerator {
            fail_on: Some("a".to_string()),
            ..Default::default()
        };
        let store = MemoryArtifactStore::new();
        let mut exec = SequentialExecutor::new(generator, store.clone(), GenerationOptions::default());

        let err = exec.run(&chain()).await.unwrap_err();

        assert!(matches!(err, PromptdagError::Generation { ref task, .. } if task == "a"));
        assert_eq!(exec.state_of("a"), Some(TaskRunState::Failed));
        assert_eq!(exec.state_of("b"), Some(TaskRunState::NotRun));
        assert!(exec.results().is_empty());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn whitespace_output_counts_as_generation_failure() {
        let generator = EchoGenerator {
            reply: Some(" \n\t".to_string()),
            ..Default::default()
        };
        let mut exec =
            SequentialExecutor::new(generator, MemoryArtifactStore::new(), GenerationOptions::default());

        match exec.run(&chain()).await {
            Err(PromptdagError::Generation { task, source: GenerationError::EmptyOutput }) => {
                assert_eq!(task, "a");
            }
            other => panic!("expected EmptyOutput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fenced_output_is_stripped_when_requested() {
        let pipeline = Pipeline::new(
            vec![Role::new("r", "DBA", "SQL", "Careful")],
            vec![Task::new("schema", "r", "sql", "schema.sql").with_strip_code_fences(true)],
        )
        .unwrap();
        let generator = EchoGenerator {
            reply: Some("```sql\nCREATE TABLE t;\n```".to_string()),
            ..Default::default()
        };
        let store = MemoryArtifactStore::new();
        let mut exec = SequentialExecutor::new(generator, store.clone(), GenerationOptions::default());

        let report = exec.run(&pipeline).await.unwrap();

        assert_eq!(report.results.get("schema").unwrap().text, "CREATE TABLE t;\n");
        assert_eq!(store.read("schema.sql").as_deref(), Some("CREATE TABLE t;\n"));
    }

    #[tokio::test]
    async fn verbose_role_logs_prompt_and_output() {
        let mut role = Role::new("r", "Archivist", "Keep records", "Patient");
        role.verbose = true;

        let logs = run_logged(role).await;

        assert!(logs.contains("Describe the widget registry."));
        assert!(logs.contains("You are Archivist."));
        assert!(logs.contains("registry notes"));
    }

    #[tokio::test]
    async fn quiet_role_keeps_prompt_and_output_out_of_logs() {
        let logs = run_logged(Role::new("r", "Archivist", "Keep records", "Patient")).await;

        assert!(logs.contains("task completed"));
        assert!(!logs.contains("Describe the widget registry."));
        assert!(!logs.contains("registry notes"));
    }

    #[tokio::test]
    async fn rerun_starts_from_scratch() {
        let mut exec = SequentialExecutor::new(
            EchoGenerator::default(),
            MemoryArtifactStore::new(),
            GenerationOptions::default(),
        );
        exec.run(&chain()).await.unwrap();
        let report = exec.run(&chain()).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(exec.generator.prompts.lock().unwrap().len(), 4);
    }
}
