use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Default binarization threshold on the 8-bit grayscale scale
pub const DEFAULT_THRESHOLD: u8 = 240;

/// Default minimum room area in square pixels
pub const DEFAULT_MIN_AREA: f64 = 1000.0;

/// Order in which room records are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomOrdering {
    /// Order in which contours are found while scanning the mask
    #[default]
    Discovery,
    /// Sorted by top edge, then left edge; ids are reassigned after sorting
    Position,
}

impl std::str::FromStr for RoomOrdering {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" => Ok(RoomOrdering::Discovery),
            "position" => Ok(RoomOrdering::Position),
            other => Err(InferenceError::InvalidConfig(format!(
                "unknown room ordering '{}' (expected 'discovery' or 'position')",
                other
            ))),
        }
    }
}

/// Room inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Grayscale values strictly below this are interior
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Contours enclosing less than this area are discarded as noise
    #[serde(default = "default_min_area")]
    pub min_area: f64,
    #[serde(default)]
    pub ordering: RoomOrdering,
    /// Draw rooms onto a copy of the input
    #[serde(default = "default_annotate")]
    pub annotate: bool,
}

fn default_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_min_area() -> f64 {
    DEFAULT_MIN_AREA
}

fn default_annotate() -> bool {
    true
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
            ordering: RoomOrdering::Discovery,
            annotate: true,
        }
    }
}

impl InferenceConfig {
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_ordering(mut self, ordering: RoomOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(InferenceError::InvalidConfig(
                "min_area must be a non-negative finite number".to_string(),
            ));
        }
        Ok(())
    }
}
