use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight::config::AppConfig;
use finsight::create_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO; override with RUST_LOG for debugging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "finsight=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let app = create_app(config.clone());

    let addr: std::net::SocketAddr = config.server_address().parse()?;
    tracing::info!("Starting finsight server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
