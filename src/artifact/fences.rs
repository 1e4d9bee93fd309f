// src/artifact/fences.rs

use std::sync::LazyLock;

use regex::Regex;

static WRAPPING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```[^\n`]*\r?\n(.*?)\r?\n?```\s*\z").expect("fence regex is valid")
});

/// If the whole of `text` is one fenced code block, return its body with a
/// trailing newline; otherwise return `text` unchanged.
///
/// Text containing more than one fence is left alone.
pub fn strip_code_fences(text: &str) -> String {
    match WRAPPING_FENCE.captures(text) {
        Some(caps) if !caps[1].contains("```") => {
            let mut body = caps[1].to_string();
            if !body.ends_with('\n') {
                body.push('\n');
            }
            body
        }
        _ => text.to_string(),
    }
}
