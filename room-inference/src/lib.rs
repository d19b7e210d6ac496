//! Room inference for floor-plan rasters.
//!
//! The pipeline binarizes the image with a fixed inverted threshold, traces
//! the outer contours of the interior regions, drops contours below a minimum
//! area and reports one [`RoomRecord`] per survivor, plus an annotated copy
//! of the input.

pub mod annotate;
pub mod codec;
pub mod config;
pub mod contours;
pub mod engine;
pub mod error;
pub mod segment;
pub mod types;

pub use codec::{decode_image, encode_image, DecodedImage};
pub use config::{InferenceConfig, RoomOrdering, DEFAULT_MIN_AREA, DEFAULT_THRESHOLD};
pub use engine::{RoomInference, RoomInferenceOutput};
pub use error::InferenceError;
pub use segment::BinaryMask;
pub use types::{BoundingBox, Centroid, RoomRecord, WallBox};
