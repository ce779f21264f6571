//! greenspace-pipeline: Pure vegetation detection pipeline (sans-IO).
//!
//! Finds vegetation-colored regions in a raster image through:
//! decode -> HSV conversion -> range threshold -> dilate/erode ->
//! coverage statistics + highlighted overlay.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and images and returns structured data. Reading and
//! writing files, report formatting and logging setup live in
//! `greenspace-export` and the `greenspace` binary.

pub mod coverage;
pub mod decode;
pub mod diagnostics;
pub mod hsv;
pub mod mask;
pub mod morphology;
pub mod overlay;
pub mod pipeline;
pub mod threshold;
pub mod types;

pub use mask::Mask;
pub use pipeline::Pipeline;
pub use types::{
    BorderPolicy, Coverage, Detection, Dimensions, GrayImage, Hsv, HsvImage, MAX_HUE,
    PipelineConfig, PipelineError, RgbImage, StagedResult, ThresholdRange,
};

use tracing::instrument;

/// Run detection on an already-decoded image.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Convert to HSV
/// 3. Threshold against the configured range
/// 4. Dilate `k` times, then erode `k` times
/// 5. Measure coverage of the refined mask
/// 6. Render the refined mask over a copy of the source
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage; no partial
/// result is produced.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect(image: &RgbImage, config: &PipelineConfig) -> Result<Detection, PipelineError> {
    Ok(run(image.clone(), config)?.into_detection())
}

/// Decode image bytes and run the full detection pipeline.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`Detection`] holding the overlay image, the coverage
/// statistic and the source dimensions.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if the bytes are empty,
/// undecodable, or decode to a zero-area image, and otherwise the first
/// error raised by any stage.
#[instrument(skip_all, fields(input_bytes = image_bytes.len()))]
pub fn process(image_bytes: &[u8], config: &PipelineConfig) -> Result<Detection, PipelineError> {
    Ok(process_staged(image_bytes, config)?.into_detection())
}

/// Like [`process`], but keeps every intermediate stage output.
///
/// # Errors
///
/// Same as [`process`].
#[instrument(skip_all, fields(input_bytes = image_bytes.len()))]
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    let image = decode::decode(image_bytes)?;
    run(image, config)
}

fn run(image: RgbImage, config: &PipelineConfig) -> Result<StagedResult, PipelineError> {
    Ok(Pipeline::new(image, config.clone())
        .convert()?
        .threshold()
        .refine()?
        .measure()?
        .render()?
        .into_result())
}
