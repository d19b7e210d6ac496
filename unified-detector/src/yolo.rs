//! YOLO detector interface
//!
//! The model itself runs outside this process. `RemoteYoloDetector` talks to
//! an inference server over HTTP; `StubYoloDetector` stands in when no server
//! is configured and `StaticDetector` replays a fixed detection list.

use crate::{filter_by_confidence, Detection};
use anyhow::Context;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;
use tracing::{info, warn};

/// YOLO detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloConfig {
    /// Inference server endpoint accepting a PNG body
    pub endpoint: Option<String>,
    /// Detections below this confidence are dropped (0.0-1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            confidence_threshold: 0.5,
            timeout_secs: 30,
        }
    }
}

/// Object detector trait - allows for different implementations
///
/// Detection is blocking; async callers should run it on a blocking thread.
pub trait ObjectDetector: Send + Sync {
    /// Detect labeled objects in an image
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;

    /// Get model info
    fn model_info(&self) -> String;
}

/// Stub implementation for when no inference server is configured
pub struct StubYoloDetector {
    config: YoloConfig,
}

impl StubYoloDetector {
    pub fn new(config: YoloConfig) -> Self {
        Self { config }
    }
}

impl ObjectDetector for StubYoloDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Err(anyhow::anyhow!(
            "YOLO detector not available. Set DETECTOR_URL to a YOLO inference endpoint."
        ))
    }

    fn model_info(&self) -> String {
        format!(
            "Stub YOLO Detector (confidence >= {})",
            self.config.confidence_threshold
        )
    }
}

/// Returns the same detections for every image
pub struct StaticDetector {
    detections: Vec<Detection>,
}

impl StaticDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl ObjectDetector for StaticDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }

    fn model_info(&self) -> String {
        format!("Static Detector ({} detections)", self.detections.len())
    }
}

/// Detector backed by a YOLO inference server
///
/// Sends the image as `image/png` and expects either a JSON array of
/// detections or an object with a `detections` array.
pub struct RemoteYoloDetector {
    client: reqwest::blocking::Client,
    endpoint: String,
    config: YoloConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorResponse {
    List(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

impl RemoteYoloDetector {
    pub fn new(config: YoloConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("YOLO endpoint not configured"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }
}

impl ObjectDetector for RemoteYoloDetector {
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        let mut png_bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .context("Failed to encode image for detector")?;

        info!("Sending {} bytes to YOLO endpoint {}", png_bytes.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("conf", self.config.confidence_threshold)])
            .header("Content-Type", "image/png")
            .body(png_bytes)
            .send()
            .context("YOLO request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            warn!("YOLO endpoint error: {} - {}", status, error_text);
            return Err(anyhow::anyhow!("YOLO endpoint error: {} - {}", status, error_text));
        }

        let body = response.text().context("Failed to read YOLO response")?;
        let detections = parse_detections(&body)?;
        Ok(filter_by_confidence(detections, self.config.confidence_threshold))
    }

    fn model_info(&self) -> String {
        format!("Remote YOLO Detector ({})", self.endpoint)
    }
}

/// Build the detector the configuration asks for
pub fn detector_from_config(config: YoloConfig) -> anyhow::Result<Box<dyn ObjectDetector>> {
    if config.endpoint.is_some() {
        Ok(Box::new(RemoteYoloDetector::new(config)?))
    } else {
        warn!("No YOLO endpoint configured, using stub detector");
        Ok(Box::new(StubYoloDetector::new(config)))
    }
}

fn parse_detections(body: &str) -> anyhow::Result<Vec<Detection>> {
    let parsed: DetectorResponse = serde_json::from_str(body)
        .map_err(|e| anyhow::anyhow!("Failed to parse detections: {}. Response: {}", e, body))?;

    Ok(match parsed {
        DetectorResponse::List(detections) => detections,
        DetectorResponse::Wrapped { detections } => detections,
    })
}
