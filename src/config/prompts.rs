/// Prompt templates are plain text files so analysts can tune the wording
/// without rebuilding the service. They are read once at startup.

use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

pub const BASE_PROMPT_FILE: &str = "base_prompt.txt";
pub const QUESTIONS_PROMPT_FILE: &str = "questions_prompt.txt";

#[derive(Debug, Clone)]
pub struct PromptStore {
    /// SQL-generation template with `{table_schema}` and `{user_question}`
    /// placeholders.
    pub base_prompt: String,
    /// Preamble for the question-generation call.
    pub questions_prompt: String,
}

impl PromptStore {
    pub fn load(dir: &Path) -> Result<Self> {
        let base_path = dir.join(BASE_PROMPT_FILE);
        let base_prompt = fs::read_to_string(&base_path)
            .with_context(|| format!("failed to read prompt file {}", base_path.display()))?;

        let questions_path = dir.join(QUESTIONS_PROMPT_FILE);
        let questions_prompt = fs::read_to_string(&questions_path)
            .with_context(|| format!("failed to read prompt file {}", questions_path.display()))?;

        Ok(Self {
            base_prompt,
            questions_prompt,
        })
    }

    pub fn render_sql_prompt(&self, table_schema: &str, user_question: &str) -> String {
        self.base_prompt
            .replace("{table_schema}", table_schema)
            .replace("{user_question}", user_question)
    }
}
