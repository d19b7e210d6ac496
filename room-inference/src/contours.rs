use image::imageops::replace;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::segment::BinaryMask;
use crate::types::BoundingBox;

/// Outer boundary of one connected interior region
#[derive(Debug, Clone, PartialEq)]
pub struct RoomContour {
    /// Boundary vertices with straight runs collapsed to their endpoints
    pub points: Vec<Point<i32>>,
    /// Polygon area enclosed by the boundary
    pub area: f64,
    pub bounds: BoundingBox,
}

/// Trace the outermost boundaries of every interior region in the mask
///
/// Hole borders and anything nested inside a hole are skipped. Contours are
/// returned in the order the raster scan meets them. Regions touching the
/// image edge are traced like any other.
pub fn find_outer_contours(mask: &BinaryMask) -> Vec<RoomContour> {
    find_contours::<i32>(&with_border(mask.as_gray()))
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let traced: Vec<Point<i32>> = c
                .points
                .iter()
                .map(|p| Point::new(p.x - BORDER as i32, p.y - BORDER as i32))
                .collect();
            let points = compress_chain(&traced);
            let area = polygon_area(&points);
            let bounds = bounding_rect(&points);
            RoomContour { points, area, bounds }
        })
        .collect()
}

/// Background margin around the mask while tracing
const BORDER: u32 = 1;

/// Copy the mask onto a zeroed canvas one pixel larger on every side
///
/// The tracer treats the image edge as foreground-adjacent, so a region
/// touching it would otherwise be reported as a hole enclosing everything else.
fn with_border(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2 * BORDER, mask.height() + 2 * BORDER);
    replace(&mut padded, mask, BORDER as i64, BORDER as i64);
    padded
}

/// Drop points that sit in the middle of a horizontal, vertical or
/// diagonal run of a closed chain
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut chain = points.to_vec();
    chain.dedup();
    if chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }

    let n = chain.len();
    if n < 3 {
        return chain;
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let compressed: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            step(prev, chain[i]) != step(chain[i], next)
        })
        .map(|i| chain[i])
        .collect();

    // A chain where every point is mid-run has no corners to keep
    if compressed.is_empty() {
        chain.truncate(1);
        chain
    } else {
        compressed
    }
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0i64;
    for i in 0..points.len() {
        let p1 = points[i];
        let p2 = points[(i + 1) % points.len()];
        twice_area += p1.x as i64 * p2.y as i64 - p2.x as i64 * p1.y as i64;
    }

    twice_area.abs() as f64 / 2.0
}

/// Smallest pixel rectangle covering all points
///
/// Points are in image coordinates. Width and height count pixels, so a
/// single point yields a 1x1 box.
pub fn bounding_rect(points: &[Point<i32>]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox::from_rect(0, 0, 0, 0);
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    BoundingBox::from_rect(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    )
}
