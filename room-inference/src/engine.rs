use image::DynamicImage;
use tracing::{debug, info};

use crate::annotate::annotate_rooms;
use crate::codec::ensure_not_empty;
use crate::config::{InferenceConfig, RoomOrdering};
use crate::contours::find_outer_contours;
use crate::error::Result;
use crate::segment::{segment, BinaryMask};
use crate::types::{RoomRecord, WallBox};

/// Result of one room inference call
#[derive(Debug, Clone)]
pub struct RoomInferenceOutput {
    pub rooms: Vec<RoomRecord>,
    /// Copy of the input with rooms drawn; equal to the input when no room survives
    pub annotated: DynamicImage,
    pub interior_pixels: usize,
    /// Outer contours found before the area filter
    pub candidate_contours: usize,
}

/// Room inference engine
///
/// Holds only configuration; every call allocates its own buffers, so one
/// instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct RoomInference {
    config: InferenceConfig,
}

impl RoomInference {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn segment(&self, image: &DynamicImage) -> BinaryMask {
        segment(image, self.config.threshold)
    }

    /// Turn a mask into room records and an annotated copy of `image`
    pub fn extract_rooms(
        &self,
        image: &DynamicImage,
        mask: &BinaryMask,
    ) -> (DynamicImage, Vec<RoomRecord>) {
        let (rooms, _) = self.collect_rooms(mask);
        let annotated = if self.config.annotate {
            annotate_rooms(image, &rooms)
        } else {
            image.clone()
        };
        (annotated, rooms)
    }

    /// Run the full pipeline on a decoded image
    ///
    /// Wall boxes only gate whether the caller runs inference at all; the
    /// pixel-level segmentation does not look at them.
    pub fn infer(&self, image: &DynamicImage, walls: &[WallBox]) -> Result<RoomInferenceOutput> {
        ensure_not_empty(image)?;
        debug!(
            "Inferring rooms on {}x{} image ({} wall boxes)",
            image.width(),
            image.height(),
            walls.len()
        );

        let mask = self.segment(image);
        let interior_pixels = mask.count_interior();

        let (rooms, candidate_contours) = self.collect_rooms(&mask);
        let annotated = if self.config.annotate {
            annotate_rooms(image, &rooms)
        } else {
            image.clone()
        };

        info!(
            "Detected {} rooms from {} candidate contours",
            rooms.len(),
            candidate_contours
        );

        Ok(RoomInferenceOutput {
            rooms,
            annotated,
            interior_pixels,
            candidate_contours,
        })
    }

    fn collect_rooms(&self, mask: &BinaryMask) -> (Vec<RoomRecord>, usize) {
        let contours = find_outer_contours(mask);
        let candidates = contours.len();

        let mut rooms = Vec::new();
        let mut room_id = 1;
        for contour in contours {
            if contour.area < self.config.min_area {
                continue;
            }
            rooms.push(RoomRecord::new(room_id, contour.bounds, contour.area));
            room_id += 1;
        }

        if self.config.ordering == RoomOrdering::Position {
            sort_by_position(&mut rooms);
        }

        (rooms, candidates)
    }
}

/// Sort by `(y1, x1)` and renumber ids from 1
pub fn sort_by_position(rooms: &mut [RoomRecord]) {
    rooms.sort_by_key(|r| (r.bounding_box.y1, r.bounding_box.x1));
    for (idx, room) in rooms.iter_mut().enumerate() {
        room.id = idx + 1;
    }
}
