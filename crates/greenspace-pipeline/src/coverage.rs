//! Coverage statistics for a refined mask.

use crate::mask::Mask;
use crate::types::{Coverage, PipelineError};

/// Compute the share of set pixels in `mask`.
///
/// # Errors
///
/// Returns [`PipelineError::DivisionUndefined`] if the mask has no
/// pixels.
#[allow(clippy::cast_precision_loss)]
pub fn coverage(mask: &Mask) -> Result<Coverage, PipelineError> {
    let total_pixels = mask.dimensions().pixel_count();
    if total_pixels == 0 {
        return Err(PipelineError::DivisionUndefined);
    }

    let candidate_pixels = mask.count_set();
    let percentage = (candidate_pixels as f64 / total_pixels as f64 * 100.0).clamp(0.0, 100.0);

    Ok(Coverage {
        total_pixels,
        candidate_pixels,
        percentage,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_is_zero_percent() {
        let c = coverage(&Mask::new(8, 8)).unwrap();
        assert_eq!(c.total_pixels, 64);
        assert_eq!(c.candidate_pixels, 0);
        assert!(c.percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn full_mask_is_hundred_percent() {
        let c = coverage(&Mask::from_fn(8, 4, |_, _| true)).unwrap();
        assert_eq!(c.candidate_pixels, 32);
        assert!((c.percentage - 100.0).abs() < f64::EPSILON);
        assert!((c.rounded_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_mask_ratio() {
        // 1 of 8 pixels set -> 12.5%.
        let c = coverage(&Mask::from_fn(4, 2, |x, y| x == 0 && y == 0)).unwrap();
        assert_eq!(c.candidate_pixels, 1);
        assert!((c.percentage - 12.5).abs() < 1e-12);
    }

    #[test]
    fn rounding_for_report() {
        // 2 of 3 pixels -> 66.666...% -> 66.67.
        let c = coverage(&Mask::from_fn(3, 1, |x, _| x > 0)).unwrap();
        assert!((c.rounded_percentage() - 66.67).abs() < 1e-9);
    }

    #[test]
    fn rounding_tie_agrees_with_report_formatting() {
        // 1 of 800 pixels -> 0.125%, written as 0.12 in the report.
        let c = coverage(&Mask::from_fn(800, 1, |x, _| x == 0)).unwrap();
        assert_eq!(format!("{:.2}", c.percentage), "0.12");
        assert!((c.rounded_percentage() - 0.12).abs() < 1e-12);
    }

    #[test]
    fn zero_pixel_mask_is_division_undefined() {
        assert!(matches!(
            coverage(&Mask::new(0, 10)),
            Err(PipelineError::DivisionUndefined)
        ));
    }

    #[test]
    fn percentage_stays_in_bounds() {
        for w in 1..6 {
            for h in 1..6 {
                let c = coverage(&Mask::from_fn(w, h, |x, y| (x + y) % 2 == 0)).unwrap();
                assert!((0.0..=100.0).contains(&c.percentage));
            }
        }
    }
}
