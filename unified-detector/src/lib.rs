use room_inference::WallBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod report;
pub mod yolo;

pub use yolo::{
    detector_from_config, ObjectDetector, RemoteYoloDetector, StaticDetector, StubYoloDetector,
    YoloConfig,
};

/// Label the detector assigns to wall segments
pub const WALL_LABEL: &str = "Wall";

/// Corner coordinates of a detection in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// One labeled object found by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    #[serde(rename = "box")]
    pub bbox: DetectionBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: DetectionBox {
                x1: bbox[0],
                y1: bbox[1],
                x2: bbox[2],
                y2: bbox[3],
            },
        }
    }

    pub fn is_wall(&self) -> bool {
        self.label == WALL_LABEL
    }
}

/// Number of detections per label, over every detection
pub fn count_labels(detections: &[Detection]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for detection in detections {
        *counts.entry(detection.label.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn has_walls(detections: &[Detection]) -> bool {
    detections.iter().any(Detection::is_wall)
}

/// Wall detections converted to the room engine's input type
pub fn wall_boxes(detections: &[Detection]) -> Vec<WallBox> {
    detections
        .iter()
        .filter(|d| d.is_wall())
        .map(|d| WallBox {
            x1: d.bbox.x1,
            y1: d.bbox.y1,
            x2: d.bbox.x2,
            y2: d.bbox.y2,
            confidence: d.confidence,
        })
        .collect()
}

/// Keep detections at or above the confidence floor
pub fn filter_by_confidence(detections: Vec<Detection>, min_confidence: f64) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= min_confidence)
        .collect()
}
