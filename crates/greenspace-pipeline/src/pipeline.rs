//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use greenspace_pipeline::{Pipeline, PipelineConfig, PipelineError, RgbImage};
//! # fn run(image: RgbImage) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(image, PipelineConfig::default())
//!     .convert()?
//!     .threshold()
//!     .refine()?
//!     .measure()?
//!     .render()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying the previously computed
//! intermediates. The raw mask is carried only until refinement has
//! completed, then handed to [`StagedResult`] untouched; the refined
//! mask is read, never written, by the measure and render stages.

use image::Rgb;
use tracing::debug;

use crate::mask::Mask;
use crate::types::{
    Coverage, Dimensions, HsvImage, PipelineConfig, PipelineError, RgbImage, StagedResult,
};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline run over an already-decoded image.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: RgbImage, config: PipelineConfig) -> Pending {
        Pending { config, image }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`convert`](Self::convert) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .convert() to continue"]
pub struct Pending {
    config: PipelineConfig,
    image: RgbImage,
}

impl Pending {
    /// The source image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.image
    }

    /// Validate the configuration and convert the source to HSV.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidThreshold`] or
    /// [`PipelineError::InvalidIteration`] for a bad configuration, and
    /// [`PipelineError::InvalidImage`] if the image has a zero dimension.
    pub fn convert(self) -> Result<Converted, PipelineError> {
        self.config.validate()?;
        let hsv = crate::hsv::to_hsv(&self.image)?;
        let dimensions = hsv.dimensions();
        debug!(%dimensions, "converted to HSV");
        Ok(Converted {
            config: self.config,
            original: self.image,
            hsv,
            dimensions,
        })
    }
}

// ───────────────────────── Stage 1: Converted ────────────────────────

/// Pipeline state after HSV conversion.
///
/// Call [`threshold`](Self::threshold) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .threshold() to continue"]
pub struct Converted {
    config: PipelineConfig,
    original: RgbImage,
    hsv: HsvImage,
    dimensions: Dimensions,
}

impl Converted {
    /// The HSV image.
    #[must_use]
    pub const fn hsv(&self) -> &HsvImage {
        &self.hsv
    }

    /// Classify every pixel against the configured range.
    pub fn threshold(self) -> Thresholded {
        let raw_mask = crate::threshold::threshold(&self.hsv, &self.config.threshold);
        debug!(
            candidates = raw_mask.count_set(),
            lower = ?self.config.threshold.lower,
            upper = ?self.config.threshold.upper,
            "thresholded"
        );
        Thresholded {
            config: self.config,
            original: self.original,
            hsv: self.hsv,
            raw_mask,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: Thresholded ──────────────────────

/// Pipeline state after range thresholding.
///
/// Call [`refine`](Self::refine) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .refine() to continue"]
pub struct Thresholded {
    config: PipelineConfig,
    original: RgbImage,
    hsv: HsvImage,
    raw_mask: Mask,
    dimensions: Dimensions,
}

impl Thresholded {
    /// The raw candidate mask.
    #[must_use]
    pub const fn raw_mask(&self) -> &Mask {
        &self.raw_mask
    }

    /// Run all dilation passes, then all erosion passes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidIteration`] if the iteration
    /// count is out of range.
    pub fn refine(self) -> Result<Refined, PipelineError> {
        let refined_mask = crate::morphology::refine(
            &self.raw_mask,
            self.config.iterations,
            self.config.border_policy,
        )?;
        debug!(
            iterations = self.config.iterations,
            border = %self.config.border_policy,
            candidates = refined_mask.count_set(),
            "refined mask"
        );
        Ok(Refined {
            config: self.config,
            original: self.original,
            hsv: self.hsv,
            raw_mask: self.raw_mask,
            refined_mask,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 3: Refined ──────────────────────────

/// Pipeline state after morphological refinement.
///
/// Call [`measure`](Self::measure) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .measure() to continue"]
pub struct Refined {
    config: PipelineConfig,
    original: RgbImage,
    hsv: HsvImage,
    raw_mask: Mask,
    refined_mask: Mask,
    dimensions: Dimensions,
}

impl Refined {
    /// The refined mask.
    #[must_use]
    pub const fn refined_mask(&self) -> &Mask {
        &self.refined_mask
    }

    /// Compute coverage of the refined mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DivisionUndefined`] for a zero-pixel
    /// mask.
    pub fn measure(self) -> Result<Measured, PipelineError> {
        let coverage = crate::coverage::coverage(&self.refined_mask)?;
        debug!(
            total = coverage.total_pixels,
            candidates = coverage.candidate_pixels,
            percentage = coverage.percentage,
            "measured coverage"
        );
        Ok(Measured {
            config: self.config,
            original: self.original,
            hsv: self.hsv,
            raw_mask: self.raw_mask,
            refined_mask: self.refined_mask,
            coverage,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 4: Measured ─────────────────────────

/// Pipeline state after coverage has been computed.
///
/// Call [`render`](Self::render) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .render() to continue"]
pub struct Measured {
    config: PipelineConfig,
    original: RgbImage,
    hsv: HsvImage,
    raw_mask: Mask,
    refined_mask: Mask,
    coverage: Coverage,
    dimensions: Dimensions,
}

impl Measured {
    /// Coverage of the refined mask.
    #[must_use]
    pub const fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Paint the refined mask over a copy of the source image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DimensionMismatch`] if the mask and the
    /// source disagree in size.
    pub fn render(self) -> Result<Rendered, PipelineError> {
        let overlay = crate::overlay::render(
            &self.original,
            &self.refined_mask,
            Rgb(self.config.highlight),
        )?;
        debug!(highlight = ?self.config.highlight, "rendered overlay");
        Ok(Rendered {
            original: self.original,
            hsv: self.hsv,
            raw_mask: self.raw_mask,
            refined_mask: self.refined_mask,
            coverage: self.coverage,
            overlay,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 5: Rendered ─────────────────────────

/// Final pipeline state: every stage has run.
///
/// Call [`into_result`](Self::into_result) to collect all intermediates.
#[must_use = "call .into_result() to collect the pipeline output"]
pub struct Rendered {
    original: RgbImage,
    hsv: HsvImage,
    raw_mask: Mask,
    refined_mask: Mask,
    coverage: Coverage,
    overlay: RgbImage,
    dimensions: Dimensions,
}

impl Rendered {
    /// The overlay image.
    #[must_use]
    pub const fn overlay(&self) -> &RgbImage {
        &self.overlay
    }

    /// Coverage of the refined mask.
    #[must_use]
    pub const fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Consume the pipeline and return every intermediate.
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            original: self.original,
            hsv: self.hsv,
            raw_mask: self.raw_mask,
            refined_mask: self.refined_mask,
            coverage: self.coverage,
            overlay: self.overlay,
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::BorderPolicy;

    fn half_green(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([30, 160, 40])
            } else {
                Rgb([120, 120, 120])
            }
        })
    }

    #[test]
    fn stages_expose_intermediates() {
        let img = half_green(10, 6);
        let pending = Pipeline::new(img.clone(), PipelineConfig::default());
        assert_eq!(pending.original(), &img);

        let converted = pending.convert().unwrap();
        assert_eq!(converted.hsv().dimensions(), Dimensions::new(10, 6));

        let thresholded = converted.threshold();
        assert_eq!(thresholded.raw_mask().count_set(), 30);

        let refined = thresholded.refine().unwrap();
        assert_eq!(refined.refined_mask().count_set(), 30);

        let measured = refined.measure().unwrap();
        assert!((measured.coverage().percentage - 50.0).abs() < 1e-12);

        let rendered = measured.render().unwrap();
        assert_eq!(*rendered.overlay().get_pixel(0, 0), Rgb([0, 255, 0]));
        assert_eq!(*rendered.overlay().get_pixel(9, 5), Rgb([120, 120, 120]));

        let staged = rendered.into_result();
        assert_eq!(staged.dimensions, Dimensions::new(10, 6));
        assert_eq!(staged.raw_mask.count_set(), 30);
    }

    #[test]
    fn invalid_config_fails_at_convert() {
        let config = PipelineConfig {
            iterations: -2,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(half_green(4, 4), config).convert();
        assert!(matches!(result, Err(PipelineError::InvalidIteration(-2))));
    }

    #[test]
    fn empty_image_fails_at_convert() {
        let result = Pipeline::new(RgbImage::new(0, 0), PipelineConfig::default()).convert();
        assert!(matches!(result, Err(PipelineError::InvalidImage { .. })));
    }

    #[test]
    fn zero_iterations_keeps_raw_mask() {
        let config = PipelineConfig {
            iterations: 0,
            border_policy: BorderPolicy::Background,
            ..PipelineConfig::default()
        };
        let staged = Pipeline::new(half_green(8, 8), config)
            .convert()
            .unwrap()
            .threshold()
            .refine()
            .unwrap()
            .measure()
            .unwrap()
            .render()
            .unwrap()
            .into_result();
        assert_eq!(staged.raw_mask, staged.refined_mask);
    }
}
