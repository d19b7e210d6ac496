use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle, `x2`/`y2` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Build from an `(x, y, w, h)` rectangle
    pub fn from_rect(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Center truncated to integer pixel coordinates
    pub fn center(&self) -> Centroid {
        Centroid {
            x: self.x1 + self.width() / 2,
            y: self.y1 + self.height() / 2,
        }
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2 && self.x2 <= width && self.y2 <= height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Centroid {
    pub x: u32,
    pub y: u32,
}

/// Wall rectangle reported by the object detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

/// One inferred room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Sequential from 1 within a single inference call
    pub id: usize,
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub area: f64,
    pub centroid: Centroid,
}

impl RoomRecord {
    pub fn new(id: usize, bounding_box: BoundingBox, area: f64) -> Self {
        Self {
            id,
            bounding_box,
            area,
            centroid: bounding_box.center(),
        }
    }
}
