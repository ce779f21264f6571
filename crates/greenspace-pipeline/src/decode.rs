//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! three-channel RGB image for the detection pipeline. Every way the
//! source can be unusable surfaces as [`PipelineError::InvalidImage`]
//! here, before any stage runs.

use image::RgbImage;

use crate::types::{Dimensions, PipelineError};

/// Decode raw image bytes into an 8-bit RGB image.
///
/// Alpha is discarded; grayscale and 16-bit sources are widened or
/// narrowed to RGB8 by the `image` crate.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if `bytes` is empty, if the
/// format is unrecognized or corrupt, or if the decoded image has a zero
/// width or height.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::invalid_image("input image data is empty"));
    }

    let img = image::load_from_memory(bytes)?.to_rgb8();
    ensure_non_empty(&img)?;
    Ok(img)
}

/// Reject images with a zero dimension.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if either axis is zero.
pub fn ensure_non_empty(image: &RgbImage) -> Result<(), PipelineError> {
    let dimensions = Dimensions::new(image.width(), image.height());
    if dimensions.is_empty() {
        return Err(PipelineError::invalid_image(format!(
            "image has zero area ({dimensions})"
        )));
    }
    Ok(())
}
