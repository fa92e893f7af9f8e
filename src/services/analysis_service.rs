/// Ask pipeline - natural-language question answering over the dataset
///
/// Three sequential steps: the completion API turns the question into SQL
/// (JSON mode), the embedded engine runs the validated query, and the
/// completion API summarizes the result table in prose.

use crate::{
    config::{prompts::PromptStore, AppConfig},
    middleware::error_handling::{AppError, Result},
    models::analysis::SqlGeneration,
    services::dataset_service::{schema_description, DatasetService, QueryResult},
    services::groq_service::{user_message, GroqRequestConfig, GroqService, SQL_MODEL},
};

const MAX_RESULTS: usize = 100;
const MAX_PROMPT_ROWS: usize = 50;

const DANGEROUS_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "TRUNCATE", "CREATE", "ATTACH", "PRAGMA",
    "GRANT", "REVOKE", "EXEC", "EXECUTE",
];

#[derive(Debug)]
pub struct AnalysisAnswer {
    pub question: String,
    pub summary: String,
    pub generated_sql: String,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

pub struct AnalysisService {
    groq: GroqService,
    dataset: DatasetService,
    prompts: PromptStore,
    table_name: String,
}

impl AnalysisService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            groq: GroqService::new(config.groq_api_key.clone(), config.groq_api_url.clone()),
            dataset: DatasetService::new(config.dataset.clone()),
            prompts: config.prompts.clone(),
            table_name: config.dataset.table_name.clone(),
        }
    }

    /// Answer a natural-language question against the dataset.
    pub async fn answer_question(&self, question: &str) -> Result<AnalysisAnswer> {
        // 1. Ask the model for SQL
        let columns = self.dataset.schema().await?;
        let schema_text = schema_description(&self.table_name, &columns);
        let prompt = self.prompts.render_sql_prompt(&schema_text, question);

        let config = GroqRequestConfig {
            model: SQL_MODEL,
            max_tokens: 1024,
            temperature: Some(0.3), // Lower temperature for more consistent SQL generation
            json_mode: true,
        };
        let reply = self.groq.send_message(vec![user_message(prompt)], config).await?;

        // 2. Parse the reply (strip markdown code fences if present)
        let json_content = strip_code_fences(&reply.content);
        let generation: SqlGeneration = serde_json::from_str(json_content).map_err(|e| {
            tracing::error!("Failed to parse SQL generation reply: {}", e);
            tracing::error!("Raw reply: {}", reply.content);
            AppError::Upstream("language model returned an unparseable reply".to_string())
        })?;

        let sql = match generation {
            SqlGeneration::Sql { sql } => sql,
            SqlGeneration::Refusal { error } => {
                tracing::warn!("Model declined to generate SQL for {:?}: {}", question, error);
                return Err(AppError::BadRequest(
                    "could not generate valid SQL for this question".to_string(),
                ));
            }
        };

        // 3. Validate and execute
        let validated_sql = validate_sql(&sql)?;
        let result = self.dataset.execute_query(&validated_sql).await?;

        tracing::info!(
            "Query executed: question={:?}, results={}, time={}ms",
            question,
            result.row_count,
            result.execution_time_ms
        );

        // 4. Summarize
        let summary = self.summarize(question, &result).await?;

        Ok(AnalysisAnswer {
            question: question.to_string(),
            summary,
            generated_sql: validated_sql,
            row_count: result.row_count,
            execution_time_ms: result.execution_time_ms,
        })
    }

    async fn summarize(&self, question: &str, result: &QueryResult) -> Result<String> {
        let prompt = format!(
            "A user asked the following question pertaining to a local database table:\n\n\
             {}\n\n\
             To answer the question, this result table was returned:\n\n\
             {}\n\
             In a few sentences, summarize the data in the table as it pertains to the \
             original user question. Avoid qualifiers like \"based on the data\" and do not \
             comment on the structure or metadata of the table itself.",
            question,
            result.to_prompt_table(MAX_PROMPT_ROWS)
        );

        let config = GroqRequestConfig {
            model: SQL_MODEL,
            max_tokens: 1024,
            temperature: None,
            json_mode: false,
        };
        let reply = self.groq.send_message(vec![user_message(prompt)], config).await?;

        Ok(reply.content.trim().to_string())
    }
}

/// Strip a surrounding Markdown code fence from a model reply, if present.
pub(crate) fn strip_code_fences(content: &str) -> &str {
    let content = content.trim();
    if content.starts_with("```json") {
        content
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else if content.starts_with("```") {
        content
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        content
    }
}

/// Reject anything that is not a plain SELECT and force a row cap.
pub(crate) fn validate_sql(sql: &str) -> Result<String> {
    let sql_upper = sql.to_uppercase();

    for keyword in DANGEROUS_KEYWORDS {
        if sql_upper.contains(keyword) {
            return Err(AppError::BadRequest(format!(
                "Forbidden SQL operation: {}",
                keyword
            )));
        }
    }

    if !sql_upper.trim().starts_with("SELECT") {
        return Err(AppError::BadRequest(
            "Only SELECT queries are allowed".to_string(),
        ));
    }

    let sql_with_limit = if !sql_upper.contains("LIMIT") {
        format!("{} LIMIT {}", sql.trim().trim_end_matches(';'), MAX_RESULTS)
    } else {
        sql.to_string()
    };

    Ok(sql_with_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_appends_limit() {
        let sql = validate_sql("SELECT country FROM finance_data;").unwrap();
        assert_eq!(sql, "SELECT country FROM finance_data LIMIT 100");
    }

    #[test]
    fn validate_keeps_existing_limit() {
        let sql = validate_sql("SELECT country FROM finance_data LIMIT 5").unwrap();
        assert_eq!(sql, "SELECT country FROM finance_data LIMIT 5");
    }

    #[test]
    fn validate_rejects_mutations() {
        assert!(validate_sql("DELETE FROM finance_data").is_err());
        assert!(validate_sql("SELECT 1; DROP TABLE finance_data").is_err());
        assert!(validate_sql("UPDATE finance_data SET profit = 0").is_err());
    }

    #[test]
    fn validate_rejects_non_select() {
        assert!(validate_sql("EXPLAIN SELECT 1").is_err());
    }

    #[test]
    fn strips_json_code_fence() {
        let fenced = "```json\n{\"sql\": \"SELECT 1\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"sql\": \"SELECT 1\"}");
    }

    #[test]
    fn strips_bare_code_fence() {
        let fenced = "```\n{\"sql\": \"SELECT 1\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"sql\": \"SELECT 1\"}");
    }

    #[test]
    fn leaves_plain_content_alone() {
        let plain = "{\"sql\": \"SELECT 1\"}";
        assert_eq!(strip_code_fences(plain), plain);
    }

    #[test]
    fn sql_generation_parses_both_shapes() {
        let sql: SqlGeneration = serde_json::from_str("{\"sql\": \"SELECT 1\"}").unwrap();
        assert!(matches!(sql, SqlGeneration::Sql { .. }));

        let refusal: SqlGeneration =
            serde_json::from_str("{\"error\": \"question is out of scope\"}").unwrap();
        assert!(matches!(refusal, SqlGeneration::Refusal { .. }));
    }
}
