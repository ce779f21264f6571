//! Morphological cleanup of the candidate mask.
//!
//! Applies `k` dilation passes followed by `k` erosion passes, each with
//! a 3×3 square neighborhood. Dilation fills small holes and gaps
//! between nearby candidates; the following erosion shrinks regions back
//! to their original extent. Note this is dilate-then-erode in that
//! fixed order, which makes the result a superset of the input under
//! [`BorderPolicy::Neutral`].
//!
//! `k` passes of a 3×3 square equal one pass of a `(2k+1)×(2k+1)`
//! square, so the neutral path wraps [`imageproc::morphology`] with the
//! L∞ norm and radius `k`. The background path erodes pass by pass since
//! `imageproc` never treats out-of-bounds pixels as background.

use imageproc::distance_transform::Norm;

use crate::mask::Mask;
use crate::types::{BorderPolicy, PipelineConfig, PipelineError};

/// Dilate `iterations` times, then erode `iterations` times.
///
/// `iterations == 0` returns a copy of `mask`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidIteration`] if `iterations` is
/// negative or exceeds [`PipelineConfig::MAX_ITERATIONS`].
pub fn refine(mask: &Mask, iterations: i32, border: BorderPolicy) -> Result<Mask, PipelineError> {
    let k = checked_radius(iterations)?;
    if k == 0 {
        return Ok(mask.clone());
    }

    let dilated = dilate(mask, k);
    let eroded = match border {
        BorderPolicy::Neutral => erode_neutral(&dilated, k),
        BorderPolicy::Background => (0..k).fold(dilated, |m, _| erode_pass_background(&m)),
    };
    Ok(eroded)
}

/// Validate an iteration count and narrow it to an `imageproc` radius.
fn checked_radius(iterations: i32) -> Result<u8, PipelineError> {
    if iterations > PipelineConfig::MAX_ITERATIONS {
        return Err(PipelineError::InvalidIteration(iterations));
    }
    u8::try_from(iterations).map_err(|_| PipelineError::InvalidIteration(iterations))
}

/// `k` passes of 3×3 dilation. Out-of-bounds pixels contribute nothing.
fn dilate(mask: &Mask, k: u8) -> Mask {
    Mask::from_gray(&imageproc::morphology::dilate(
        mask.as_gray(),
        Norm::LInf,
        k,
    ))
}

/// `k` passes of 3×3 erosion, ignoring out-of-bounds pixels.
fn erode_neutral(mask: &Mask, k: u8) -> Mask {
    Mask::from_gray(&imageproc::morphology::erode(
        mask.as_gray(),
        Norm::LInf,
        k,
    ))
}

/// One 3×3 erosion pass where out-of-bounds pixels count as unset.
///
/// Every pixel on the image border is therefore cleared.
fn erode_pass_background(mask: &Mask) -> Mask {
    let (w, h) = (mask.width(), mask.height());
    Mask::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
            return false;
        }
        (y - 1..=y + 1).all(|ny| (x - 1..=x + 1).all(|nx| mask.get(nx, ny)))
    })
}
