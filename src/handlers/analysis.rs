/// REST API handlers for natural-language analysis

use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AppConfig,
    middleware::error_handling::{AppError, Result},
    models::analysis::{AnswerResponse, AskRequest},
    services::AnalysisService,
};

/// POST /api/analysis/ask
/// Answer a natural-language question about the dataset
pub async fn ask_question(
    State(config): State<AppConfig>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerResponse>> {
    request.validate().map_err(AppError::Validation)?;

    tracing::info!("Analysis question received: {:?}", request.question);

    let service = AnalysisService::new(&config);
    let answer = service.answer_question(&request.question).await?;

    Ok(Json(AnswerResponse {
        question: answer.question,
        summary: answer.summary,
        generated_sql: answer.generated_sql,
        row_count: answer.row_count,
        execution_time_ms: answer.execution_time_ms,
        answered_at: Utc::now(),
    }))
}
