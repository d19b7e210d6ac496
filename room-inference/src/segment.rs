use image::{DynamicImage, GrayImage, Luma};

const INTERIOR: u8 = 255;
const BACKGROUND: u8 = 0;

/// Per-pixel interior/background classification of a floor plan
///
/// Backed by a grayscale buffer holding 255 for interior pixels and 0
/// otherwise, which is the layout the contour tracer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    pixels: GrayImage,
}

impl BinaryMask {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether the pixel at (x, y) is interior; out-of-bounds reads are false
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        self.pixels.get_pixel(x, y)[0] == INTERIOR
    }

    pub fn count_interior(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] == INTERIOR).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }
}

/// Convert to grayscale and binarize with inverted polarity
///
/// Pixels strictly darker than `threshold` become interior. Images with more
/// than 8 bits per channel are rescaled to 8 bits first, so the threshold
/// applies proportionally.
pub fn segment(img: &DynamicImage, threshold: u8) -> BinaryMask {
    let gray = img.to_luma8();
    threshold_inverted(&gray, threshold)
}

fn threshold_inverted(gray: &GrayImage, threshold: u8) -> BinaryMask {
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in gray.enumerate_pixels() {
        let val = if pixel[0] < threshold { INTERIOR } else { BACKGROUND };
        binary.put_pixel(x, y, Luma([val]));
    }
    BinaryMask { pixels: binary }
}
