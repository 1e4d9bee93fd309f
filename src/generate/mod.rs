// src/generate/mod.rs

//! Text-generation capability.
//!
//! The executor talks to a [`Generator`] instead of an HTTP client directly,
//! so tests can substitute a deterministic stub.
//!
//! - [`openai`] provides `OpenAiGenerator`, the production implementation
//!   for OpenAI-compatible chat-completion APIs.

pub mod openai;

use std::future::Future;
use std::pin::Pin;

use crate::config::model::ConfigSection;
use crate::errors::GenerationError;
use crate::pipeline::TaskId;

pub use openai::OpenAiGenerator;

/// Model settings sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_tokens: None,
        }
    }
}

impl From<&ConfigSection> for GenerationOptions {
    fn from(cfg: &ConfigSection) -> Self {
        Self {
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Task the call is made for; used for diagnostics only.
    pub task: TaskId,
    /// Role persona (system text).
    pub persona: String,
    /// Combined task prompt (user text).
    pub prompt: String,
    /// Expected-output description, as a hint.
    pub expected_output: String,
    pub options: GenerationOptions,
}

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<String, GenerationError>> + Send + 'a>>;

/// Prompt in, text out.
///
/// Implementations must not retry internally; a failure is reported once and
/// ends the run.
pub trait Generator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a>;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        (**self).generate(request)
    }
}
