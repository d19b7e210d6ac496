use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::{InferenceError, Result};

/// Decoded pixels together with the encoding they arrived in
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Decode image bytes, rejecting unknown encodings and empty grids
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    if bytes.is_empty() {
        return Err(InferenceError::InvalidImage("no image data".to_string()));
    }

    let format = image::guess_format(bytes)
        .map_err(|e| InferenceError::InvalidImage(format!("unrecognized encoding: {}", e)))?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| InferenceError::InvalidImage(format!("failed to decode image: {}", e)))?;

    ensure_not_empty(&image)?;
    Ok(DecodedImage { image, format })
}

pub fn ensure_not_empty(image: &DynamicImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InferenceError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// Encode an image, falling back to PNG when the format has no encoder
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let format = if format.writing_enabled() { format } else { ImageFormat::Png };

    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(|e| InferenceError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([255u8, 255, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image(&png_bytes(30, 20)).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.image.width(), decoded.image.height()), (30, 20));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(err.is_invalid_image());

        let err = decode_image(&[]).unwrap_err();
        assert!(err.is_invalid_image());
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let bytes = png_bytes(30, 20);
        let err = decode_image(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(err.is_invalid_image());
    }

    #[test]
    fn test_empty_dimensions_rejected() {
        let img = DynamicImage::new_rgb8(0, 10);
        assert!(matches!(
            ensure_not_empty(&img),
            Err(InferenceError::EmptyImage { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_encode_keeps_format() {
        let decoded = decode_image(&png_bytes(8, 8)).unwrap();
        let bytes = encode_image(&decoded.image, ImageFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        let bytes = encode_image(&decoded.image, decoded.format).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }
}
