//! RGB to HSV color-space conversion.
//!
//! Produces the 8-bit HSV encoding used by most computer-vision
//! toolkits, so published vegetation ranges can be used as-is:
//!
//! - `value = max(r, g, b)`
//! - `saturation = 255 * (max - min) / max`, or 0 for black
//! - `hue = hue_degrees / 2`, in `0..=179`
//!
//! Each output pixel depends only on the matching input pixel.

use image::{Rgb, RgbImage};

use crate::decode::ensure_non_empty;
use crate::types::{Hsv, HsvImage, MAX_HUE, PipelineError};

/// Convert an RGB image to HSV.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if the image has a zero
/// width or height.
pub fn to_hsv(image: &RgbImage) -> Result<HsvImage, PipelineError> {
    ensure_non_empty(image)?;
    Ok(HsvImage::from_fn(image.width(), image.height(), |x, y| {
        rgb_to_hsv(*image.get_pixel(x, y))
    }))
}

/// Convert a single RGB pixel to HSV.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> Hsv {
    let [r, g, b] = pixel.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = f32::from(max - min);

    let saturation = if max == 0 {
        0
    } else {
        (255.0 * chroma / f32::from(max)).round() as u8
    };

    if max == min {
        return Hsv::new(0, saturation, max);
    }

    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let degrees = if max == pixel.0[0] {
        60.0 * (g - b) / chroma
    } else if max == pixel.0[1] {
        60.0 * (b - r) / chroma + 120.0
    } else {
        60.0 * (r - g) / chroma + 240.0
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };

    // 359.x degrees rounds up to 180, which is the same hue as 0.
    let half = (degrees / 2.0).round() as u8;
    let hue = if half > MAX_HUE { 0 } else { half };

    Hsv::new(hue, saturation, max)
}
