use image::DynamicImage;
use room_inference::{InferenceError, RoomInference, RoomRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use unified_detector::{count_labels, has_walls, wall_boxes, Detection, ObjectDetector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Everything the detect endpoint reports for one floor plan
#[derive(Debug, Clone, Serialize)]
pub struct FloorPlanAnalysis {
    pub detections: Vec<Detection>,
    pub object_counts: BTreeMap<String, usize>,
    pub rooms: Vec<RoomRecord>,
    pub image_size: ImageSize,
    /// Present only when room inference ran
    #[serde(skip)]
    pub annotated: Option<DynamicImage>,
}

#[derive(Debug)]
pub enum AnalysisError {
    Image(InferenceError),
    Detection(anyhow::Error),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Image(e) => write!(f, "{}", e),
            AnalysisError::Detection(e) => write!(f, "Object detection failed: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<InferenceError> for AnalysisError {
    fn from(err: InferenceError) -> Self {
        AnalysisError::Image(err)
    }
}

/// Detect objects, tally labels and, when walls are present, infer rooms
pub fn analyze_floor_plan(
    detector: &dyn ObjectDetector,
    engine: &RoomInference,
    image: &DynamicImage,
) -> Result<FloorPlanAnalysis, AnalysisError> {
    room_inference::codec::ensure_not_empty(image)?;

    let detections = detector.detect(image).map_err(AnalysisError::Detection)?;
    let object_counts = count_labels(&detections);
    info!(
        "Detector returned {} objects across {} labels",
        detections.len(),
        object_counts.len()
    );

    let (rooms, annotated) = if has_walls(&detections) {
        let walls = wall_boxes(&detections);
        let output = engine.infer(image, &walls)?;
        (output.rooms, Some(output.annotated))
    } else {
        info!("No walls detected, skipping room inference");
        (Vec::new(), None)
    };

    Ok(FloorPlanAnalysis {
        detections,
        object_counts,
        rooms,
        image_size: ImageSize {
            width: image.width(),
            height: image.height(),
        },
        annotated,
    })
}
