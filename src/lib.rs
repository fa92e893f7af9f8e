pub mod config;
pub mod models;
pub mod services;
pub mod handlers;
pub mod middleware;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use config::AppConfig;
use handlers::{analysis, dataset, report};

pub fn create_app(config: AppConfig) -> Router {
    let cors_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(header_val) => Some(header_val),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    tracing::info!("CORS configured with {} allowed origins", cors_origins.len());

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .nest(
            "/api/analysis",
            Router::new().route("/ask", post(analysis::ask_question)),
        )
        .nest(
            "/api/reports",
            Router::new().route("/generate", post(report::generate_report)),
        )
        .nest(
            "/api/dataset",
            Router::new().route("/schema", get(dataset::get_schema)),
        )
        .route("/api/health", get(dataset::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    middleware::request_id_middleware,
                ))
                .layer(cors),
        )
        .with_state(config)
}
