//! Overlay rendering: recolor detected pixels on a copy of the source.

use image::{Rgb, RgbImage};

use crate::mask::Mask;
use crate::types::{Dimensions, PipelineError};

/// Copy `image`, replacing every pixel set in `mask` with `highlight`.
///
/// This is a hard replacement with no blending. Pixels not set in the
/// mask are copied unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if `mask` and `image`
/// differ in size. No partial image is produced.
pub fn render(image: &RgbImage, mask: &Mask, highlight: Rgb<u8>) -> Result<RgbImage, PipelineError> {
    let expected = Dimensions::new(image.width(), image.height());
    let actual = mask.dimensions();
    if expected != actual {
        return Err(PipelineError::DimensionMismatch { expected, actual });
    }

    Ok(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get(x, y) {
            highlight
        } else {
            *image.get_pixel(x, y)
        }
    }))
}
