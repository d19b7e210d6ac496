// Run room inference on a floor-plan image file
use anyhow::{bail, Context};
use room_inference::{decode_image, encode_image, InferenceConfig, RoomInference, RoomOrdering};
use std::fs;
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: detect-rooms <IMAGE> [ANNOTATED_OUTPUT]");
    };
    let output = args.next().map(PathBuf::from);

    let mut config = InferenceConfig::default();
    if let Ok(min_area) = std::env::var("ROOM_MIN_AREA") {
        config.min_area = min_area.parse().context("ROOM_MIN_AREA must be a number")?;
    }
    if let Ok(threshold) = std::env::var("ROOM_THRESHOLD") {
        config.threshold = threshold.parse().context("ROOM_THRESHOLD must be 0-255")?;
    }
    if let Ok(ordering) = std::env::var("ROOM_ORDERING") {
        config.ordering = ordering.parse::<RoomOrdering>()?;
    }

    let bytes = fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let decoded = decode_image(&bytes)?;
    info!(
        "Loaded {} ({}x{}, {:?})",
        input.display(),
        decoded.image.width(),
        decoded.image.height(),
        decoded.format
    );

    let engine = RoomInference::new(config)?;
    let result = engine.infer(&decoded.image, &[])?;

    println!("{}", serde_json::to_string_pretty(&result.rooms)?);

    if let Some(path) = output {
        let format = image::ImageFormat::from_path(&path).unwrap_or(decoded.format);
        let encoded = encode_image(&result.annotated, format)?;
        fs::write(&path, encoded).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Annotated image written to {}", path.display());
    }

    Ok(())
}
