use anyhow::Context;
use room_inference::{InferenceConfig, RoomOrdering};
use unified_detector::YoloConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8080,http://127.0.0.1:8080,http://localhost:5173,http://127.0.0.1:5173";
/// 16 MiB upload limit
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Server settings, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub detector: YoloConfig,
    pub inference: InferenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            detector: YoloConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            config.allowed_origins = split_origins(&origins);
        }
        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .context("MAX_UPLOAD_BYTES must be a byte count")?;
        }

        config.detector.endpoint = lookup("DETECTOR_URL").filter(|url| !url.trim().is_empty());
        if let Some(confidence) = lookup("DETECTOR_CONFIDENCE") {
            let confidence: f64 = confidence
                .trim()
                .parse()
                .context("DETECTOR_CONFIDENCE must be a number")?;
            if !(0.0..=1.0).contains(&confidence) {
                anyhow::bail!("DETECTOR_CONFIDENCE must be within [0, 1], got {}", confidence);
            }
            config.detector.confidence_threshold = confidence;
        }

        if let Some(threshold) = lookup("ROOM_THRESHOLD") {
            config.inference.threshold = threshold
                .trim()
                .parse()
                .context("ROOM_THRESHOLD must be an integer in 0-255")?;
        }
        if let Some(min_area) = lookup("ROOM_MIN_AREA") {
            config.inference.min_area = min_area
                .trim()
                .parse()
                .context("ROOM_MIN_AREA must be a number")?;
        }
        if let Some(ordering) = lookup("ROOM_ORDERING") {
            config.inference.ordering = ordering.parse::<RoomOrdering>()?;
        }
        config.inference.validate()?;

        Ok(config)
    }
}

fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
