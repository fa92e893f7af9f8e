/// Report pipeline - date-ranged analysis reports
///
/// The question model proposes candidate analysis questions for a date range,
/// then each question runs through the ask pipeline. Questions that fail at
/// any stage are logged and skipped; the report carries whatever succeeded.

use std::collections::HashMap;

use crate::{
    config::AppConfig,
    middleware::error_handling::Result,
    services::analysis_service::AnalysisService,
    services::dataset_service::{schema_description, DatasetService},
    services::groq_service::{
        assistant_message, user_message, GroqRequestConfig, GroqService, QUESTION_MODEL,
    },
};

const QUESTION_COUNT: usize = 5;

pub struct ReportService {
    groq: GroqService,
    analysis: AnalysisService,
    dataset: DatasetService,
    questions_prompt: String,
    table_name: String,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            groq: GroqService::new(config.groq_api_key.clone(), config.groq_api_url.clone()),
            analysis: AnalysisService::new(config),
            dataset: DatasetService::new(config.dataset.clone()),
            questions_prompt: config.prompts.questions_prompt.clone(),
            table_name: config.dataset.table_name.clone(),
        }
    }

    /// Generate candidate questions for the date range and answer each one.
    pub async fn generate_report(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<HashMap<String, String>> {
        let questions = self.generate_questions(start_date, end_date).await?;
        tracing::info!(
            "Generated {} candidate questions for {}..{}",
            questions.len(),
            start_date,
            end_date
        );

        let mut answers = HashMap::new();
        for question in questions {
            match self.analysis.answer_question(&question).await {
                Ok(answer) => {
                    answers.insert(question, answer.summary);
                }
                Err(e) => {
                    tracing::warn!("Skipping question {:?}: {}", question, e);
                    continue;
                }
            }
        }

        Ok(answers)
    }

    async fn generate_questions(&self, start_date: &str, end_date: &str) -> Result<Vec<String>> {
        let columns = self.dataset.schema().await?;
        let columns_text = schema_description(&self.table_name, &columns);

        let instruction = format!(
            "Based on the table columns provided—\n{}\n—generate only {} questions that will \
             help in analyzing and creating a comprehensive company report dated between {} \
             and {}.\nStrictly format the output as: question1 + question2 + ...\n\n\
             Reminder: ONLY questions, do not generate anything else.",
            columns_text, QUESTION_COUNT, start_date, end_date
        );

        let messages = vec![
            assistant_message(self.questions_prompt.clone()),
            user_message(instruction),
        ];
        let config = GroqRequestConfig {
            model: QUESTION_MODEL,
            max_tokens: 1024,
            temperature: None,
            json_mode: false,
        };
        let reply = self.groq.send_message(messages, config).await?;

        Ok(split_questions(&reply.content))
    }
}

/// The question model is instructed to reply `question1 + question2 + ...`.
pub(crate) fn split_questions(raw: &str) -> Vec<String> {
    raw.split(" + ")
        .map(str::trim)
        .filter(|question| !question.is_empty())
        .map(str::to_string)
        .collect()
}
