/// Models for the natural-language analysis endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 500, message = "Question must be 1-500 characters"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub question: String,
    pub summary: String,
    pub generated_sql: String,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub answered_at: DateTime<Utc>,
}

/// Reply shape the completion API is instructed to produce in JSON mode:
/// either a runnable query or a refusal.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SqlGeneration {
    Sql { sql: String },
    Refusal { error: String },
}
