/// REST API handlers for dataset introspection and liveness

use axum::{extract::State, Json};

use crate::{
    config::AppConfig,
    middleware::error_handling::Result,
    models::dataset::{ColumnInfo, SchemaResponse},
    services::DatasetService,
};

/// GET /api/dataset/schema
/// Inferred column schema of the configured dataset
pub async fn get_schema(State(config): State<AppConfig>) -> Result<Json<SchemaResponse>> {
    let service = DatasetService::new(config.dataset.clone());
    let columns = service.schema().await?;

    Ok(Json(SchemaResponse {
        table: config.dataset.table_name.clone(),
        columns: columns
            .into_iter()
            .map(|(name, column_type)| ColumnInfo {
                name,
                sql_type: column_type.sql_name().to_string(),
            })
            .collect(),
    }))
}

/// GET /api/health
pub async fn health_check(State(config): State<AppConfig>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "dataset_present": config.dataset.csv_path.exists(),
    }))
}
