//! HSV range thresholding.
//!
//! Classifies every pixel of an [`HsvImage`] as a vegetation candidate
//! when all three channels fall inside a [`ThresholdRange`]. No spatial
//! context is used; neighborhood cleanup happens in
//! [`morphology`](crate::morphology).

use crate::mask::Mask;
use crate::types::{HsvImage, ThresholdRange};

/// Build the raw candidate mask.
///
/// Bounds are inclusive on both ends: a pixel equal to a bound on some
/// channel still matches on that channel.
#[must_use = "returns the raw candidate mask"]
pub fn threshold(image: &HsvImage, range: &ThresholdRange) -> Mask {
    Mask::from_fn(image.width(), image.height(), |x, y| {
        range.contains(image.get_pixel(x, y))
    })
}
