use axum::{
    extract::{DefaultBodyLimit, Json},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use room_inference::RoomInference;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use unified_detector::ObjectDetector;

pub mod analysis;
pub mod config;
mod handlers;

pub use config::ServerConfig;

/// Shared, read-only state handed to every request
pub struct AppState {
    pub detector: Arc<dyn ObjectDetector>,
    pub engine: RoomInference,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: ServerConfig) -> anyhow::Result<Self> {
        let engine = RoomInference::new(config.inference.clone())?;
        Ok(Self {
            detector,
            engine,
            config,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Create the Axum app with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        // Fallback to Any only if no valid origins configured
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    };

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/detect", post(handlers::detect_handler))
        .route("/detect/rooms", post(handlers::detect_rooms_handler))
        .route("/report/csv", post(handlers::report_csv_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
