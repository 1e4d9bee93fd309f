// src/pipeline/prompt.rs

//! Combined prompt construction.
//!
//! The persona becomes the system part of a request; the task instruction,
//! the expected-output hint and any resolved context form the user part.

use crate::pipeline::model::{Role, Task};

/// Heading that introduces prerequisite output in a prompt.
pub const CONTEXT_HEADING: &str = "This is the context you're working with:";

const EXPECTED_OUTPUT_HEADING: &str = "This is the expected criteria for your final answer:";

const COMPLETE_ANSWER_NOTE: &str =
    "You MUST return the actual complete content as the final answer, not a summary.";

/// System text describing who is answering.
pub fn persona(role: &Role) -> String {
    format!(
        "You are {}. {}\nYour personal goal is: {}",
        role.title.trim(),
        role.backstory.trim(),
        role.goal.trim()
    )
}

/// User text for `task`. The context section is omitted when `context` is
/// empty.
pub fn build_prompt(task: &Task, context: &str) -> String {
    let mut prompt = task.description.trim().to_string();

    if !task.expected_output.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(EXPECTED_OUTPUT_HEADING);
        prompt.push(' ');
        prompt.push_str(task.expected_output.trim());
        prompt.push('\n');
        prompt.push_str(COMPLETE_ANSWER_NOTE);
    }

    if !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADING);
        prompt.push('\n');
        prompt.push_str(context);
    }

    prompt
}
