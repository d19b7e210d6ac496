use image::ImageError;

/// Error types for room inference
#[derive(Debug)]
pub enum InferenceError {
    /// Bytes could not be decoded into a pixel grid
    InvalidImage(String),
    /// Decoded image has no pixels
    EmptyImage { width: u32, height: u32 },
    /// Configuration values outside their valid range
    InvalidConfig(String),
    /// Annotated image could not be re-encoded
    Encode(String),
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            InferenceError::EmptyImage { width, height } => {
                write!(f, "Invalid image: empty dimensions {}x{}", width, height)
            }
            InferenceError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            InferenceError::Encode(msg) => write!(f, "Image encoding error: {}", msg),
        }
    }
}

impl std::error::Error for InferenceError {}

impl From<ImageError> for InferenceError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Encoding(e) => InferenceError::Encode(e.to_string()),
            other => InferenceError::InvalidImage(other.to_string()),
        }
    }
}

impl InferenceError {
    /// True for the failures caused by the caller's input image
    pub fn is_invalid_image(&self) -> bool {
        matches!(
            self,
            InferenceError::InvalidImage(_) | InferenceError::EmptyImage { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;
