use anyhow::Context;
use axum_backend::{create_app, AppState, ServerConfig};
use std::sync::Arc;
use tracing::info;
use unified_detector::detector_from_config;

// The remote detector owns a blocking HTTP client, which must be built and
// dropped outside the async runtime. Main stays synchronous and keeps the
// last reference to the state.
fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Floor Plan Room Inference Server");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let detector = Arc::from(detector_from_config(config.detector.clone())?);
    let state = Arc::new(AppState::new(detector, config)?);
    info!("Object detector: {}", state.detector.model_info());
    info!(
        "Room inference: threshold={} min_area={} ordering={:?}",
        state.engine.config().threshold,
        state.engine.config().min_area,
        state.engine.config().ordering
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    let app = create_app(Arc::clone(&state));
    let addr = state.config.bind_addr.clone();

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Server listening on {}", addr);
        axum::serve(listener, app).await.context("Server error")
    })
}
