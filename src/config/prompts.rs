//! Prompt template for answer generation.
//!
//! The template can be overridden in the `[prompts]` section of the config file.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PLACEHOLDER_PATTERN: &str = r"\{\{(\w+)\}\}";

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Answer prompt. `{{context}}` and `{{question}}` are substituted.
    pub template: String,
    /// Separator placed between rendered context chunks.
    pub separator: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            template: r#"You are an expert code-history assistant. Use the git diff context to answer.
{{context}}

Question: {{question}}"#
                .to_string(),
            separator: "\n\n---\n\n".to_string(),
        }
    }
}

impl PromptSettings {
    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in a single pass over the template, so
    /// substituted values are never scanned again. Unknown placeholders are
    /// left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let placeholder = Regex::new(PLACEHOLDER_PATTERN).expect("Invalid regex");
        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
