/// REST API handlers for report generation

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    config::AppConfig,
    middleware::error_handling::{AppError, Result},
    models::report::{GenerateReportRequest, ReportData, ReportResponse},
    services::ReportService,
};

/// POST /api/reports/generate
/// Generate analysis questions for a date range and answer each one
pub async fn generate_report(
    State(config): State<AppConfig>,
    Json(request): Json<GenerateReportRequest>,
) -> Result<Json<ReportResponse>> {
    request.validate().map_err(AppError::Validation)?;

    tracing::info!(
        "Report requested for {} to {}",
        request.start_date,
        request.end_date
    );

    let service = ReportService::new(&config);
    let questions = service
        .generate_report(&request.start_date, &request.end_date)
        .await?;

    Ok(Json(ReportResponse {
        message: "questions generated successfully".to_string(),
        status: "success".to_string(),
        data: ReportData { questions },
    }))
}
