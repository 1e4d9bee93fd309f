use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use promptdag::errors::GenerationError;
use promptdag::generate::{GenerateFuture, GenerationRequest, Generator};

/// A fake generator that:
/// - records every request it receives, in order
/// - answers with a scripted reply per task, or `"<task> output"` by default
/// - fails with `GenerationError::Unauthorized` for tasks marked failing
///
/// Clones share the request log, so a test can keep one handle while the
/// executor owns another.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<HashMap<String, String>>,
    failing: Arc<HashSet<String>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `text` when asked to generate for `task`.
    pub fn reply(mut self, task: &str, text: &str) -> Self {
        Arc::make_mut(&mut self.replies).insert(task.to_string(), text.to_string());
        self
    }

    /// Fail every request for `task`.
    pub fn fail_on(mut self, task: &str) -> Self {
        Arc::make_mut(&mut self.failing).insert(task.to_string());
        self
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Task identifiers of all requests, in call order.
    pub fn called_tasks(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.task).collect()
    }

    /// The prompt sent for `task`, if it was called.
    pub fn prompt_for(&self, task: &str) -> Option<String> {
        self.requests()
            .into_iter()
            .find(|r| r.task == task)
            .map(|r| r.prompt)
    }
}

impl Generator for ScriptedGenerator {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());

            if self.failing.contains(&request.task) {
                return Err(GenerationError::Unauthorized {
                    status: 401,
                    body: "invalid api key".to_string(),
                });
            }

            Ok(self
                .replies
                .get(&request.task)
                .cloned()
                .unwrap_or_else(|| format!("{} output", request.task)))
        })
    }
}
