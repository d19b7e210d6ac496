use axum::{
    extract::{Json, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use room_inference::{decode_image, encode_image, InferenceError, RoomInference, RoomOrdering, RoomRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use unified_detector::{count_labels, report::label_counts_csv};
use uuid::Uuid;

use crate::analysis::{analyze_floor_plan, AnalysisError, FloorPlanAnalysis, ImageSize};
use crate::{api_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    detector: String,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        detector: state.detector.model_info(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct DetectParams {
    #[serde(default)]
    include_annotated: bool,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    #[serde(flatten)]
    analysis: FloorPlanAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotated_image: Option<String>,
}

/// Full analysis of an uploaded floor plan: detections, label counts and rooms
pub async fn detect_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetectParams>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let upload = read_upload(multipart).await?;
        info!("Received floor plan upload, size: {} bytes", upload.len());
        let start_time = Instant::now();

        let response = run_blocking(move || {
            let decoded = decode_image(&upload).map_err(inference_error)?;
            info!("Image loaded: {}x{}", decoded.image.width(), decoded.image.height());

            let analysis = analyze_floor_plan(state.detector.as_ref(), &state.engine, &decoded.image)
                .map_err(analysis_error)?;

            let annotated_image = match (&analysis.annotated, params.include_annotated) {
                (Some(img), true) => Some(to_data_url(img, decoded.format)?),
                _ => None,
            };

            Ok(DetectResponse {
                analysis,
                annotated_image,
            })
        })
        .await?;

        info!(
            "Detected {} objects and {} rooms in {}ms",
            response.analysis.detections.len(),
            response.analysis.rooms.len(),
            start_time.elapsed().as_millis()
        );
        Ok(Json(response))
    }
    .instrument(info_span!("detect", %request_id))
    .await
}

#[derive(Debug, Deserialize)]
pub struct ImageDetectRequest {
    /// Base64 image, optionally as a data URL
    pub image: String,
    pub threshold: Option<u8>,
    pub min_area: Option<f64>,
    pub ordering: Option<RoomOrdering>,
    #[serde(default)]
    pub include_annotated: bool,
}

#[derive(Debug, Serialize)]
pub struct DetectRoomsResponse {
    pub rooms: Vec<RoomRecord>,
    pub total_rooms: usize,
    pub image_size: ImageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
}

/// Room inference only, without the object detector or the wall gate
pub async fn detect_rooms_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageDetectRequest>,
) -> Result<Json<DetectRoomsResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        info!("Received room detection request");

        let payload = strip_data_url(&request.image);
        let img_bytes = STANDARD.decode(payload).map_err(|e| {
            warn!("Failed to decode base64 image: {}", e);
            api_error(
                StatusCode::BAD_REQUEST,
                "INVALID_BASE64",
                format!("Failed to decode base64 image: {}", e),
            )
        })?;
        info!("Image decoded, size: {} bytes", img_bytes.len());

        let mut config = state.engine.config().clone();
        if let Some(threshold) = request.threshold {
            config.threshold = threshold;
        }
        if let Some(min_area) = request.min_area {
            config.min_area = min_area;
        }
        if let Some(ordering) = request.ordering {
            config.ordering = ordering;
        }
        let engine = RoomInference::new(config).map_err(inference_error)?;
        let include_annotated = request.include_annotated;

        let response = run_blocking(move || {
            let decoded = decode_image(&img_bytes).map_err(inference_error)?;
            let output = engine.infer(&decoded.image, &[]).map_err(inference_error)?;

            let annotated_image = if include_annotated {
                Some(to_data_url(&output.annotated, decoded.format)?)
            } else {
                None
            };

            Ok(DetectRoomsResponse {
                total_rooms: output.rooms.len(),
                rooms: output.rooms,
                image_size: ImageSize {
                    width: decoded.image.width(),
                    height: decoded.image.height(),
                },
                annotated_image,
            })
        })
        .await?;

        info!("Detected {} rooms", response.total_rooms);
        Ok(Json(response))
    }
    .instrument(info_span!("detect_rooms", %request_id))
    .await
}

/// Label counts of an uploaded floor plan as a CSV attachment
pub async fn report_csv_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let upload = read_upload(multipart).await?;
        info!("Received report upload, size: {} bytes", upload.len());

        let csv = run_blocking(move || {
            let decoded = decode_image(&upload).map_err(inference_error)?;
            let detections = state
                .detector
                .detect(&decoded.image)
                .map_err(|e| analysis_error(AnalysisError::Detection(e)))?;
            label_counts_csv(&count_labels(&detections)).map_err(|e| {
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    format!("Failed to build CSV: {}", e),
                )
            })
        })
        .await?;

        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"object_counts.csv\""),
            ],
            csv,
        )
            .into_response())
    }
    .instrument(info_span!("report_csv", %request_id))
    .await
}

/// Pull the bytes of the `file` part out of a multipart body
async fn read_upload(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), "INVALID_UPLOAD", e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let unnamed = field.file_name() == Some("");

        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), "INVALID_UPLOAD", e.body_text()))?;

        if unnamed || data.is_empty() {
            warn!("Upload rejected: empty file part");
            return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_FILE", "No selected file"));
        }
        return Ok(data.to_vec());
    }

    warn!("Upload rejected: no file part");
    Err(api_error(StatusCode::BAD_REQUEST, "NO_FILE", "No file part"))
}

/// CPU-bound work runs off the async reactor
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            format!("Worker task failed: {}", e),
        )
    })?
}

fn inference_error(err: InferenceError) -> ApiError {
    match err {
        InferenceError::InvalidImage(_) | InferenceError::EmptyImage { .. } => {
            warn!("Rejected image: {}", err);
            api_error(
                StatusCode::BAD_REQUEST,
                "INVALID_IMAGE",
                format!("Could not read image: {}", err),
            )
        }
        InferenceError::InvalidConfig(_) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_CONFIG", err.to_string())
        }
        InferenceError::Encode(_) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
        }
    }
}

fn analysis_error(err: AnalysisError) -> ApiError {
    match err {
        AnalysisError::Image(e) => inference_error(e),
        AnalysisError::Detection(e) => {
            warn!("Detection failed: {:#}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DETECTION_FAILED",
                format!("Object detection failed: {}", e),
            )
        }
    }
}

fn strip_data_url(image: &str) -> &str {
    if image.starts_with("data:") {
        image.split_once(',').map(|(_, data)| data).unwrap_or(image)
    } else {
        image
    }
}

/// Encode in the upload's format and wrap as a data URL
fn to_data_url(image: &DynamicImage, format: ImageFormat) -> Result<String, ApiError> {
    let bytes = encode_image(image, format).map_err(inference_error)?;
    let mime = image::guess_format(&bytes).unwrap_or(format).to_mime_type();
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
}
