//! Shared types for the greenspace vegetation detection pipeline.

use serde::{Deserialize, Serialize};

use crate::mask::Mask;

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// source and the overlay without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage`, the backing store of [`Mask`].
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions from a width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Largest representable hue.
///
/// Hue is stored as degrees halved so the full circle fits in a byte:
/// `0..=179` covers `0°..358°`.
pub const MAX_HUE: u8 = 179;

/// A pixel in hue/saturation/value coordinates.
///
/// `hue` is cyclic in `0..=`[`MAX_HUE`]; `saturation` and `value` span
/// `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    /// Color tone, in half-degrees.
    pub hue: u8,
    /// Colorfulness relative to brightness.
    pub saturation: u8,
    /// Brightness (the largest input channel).
    pub value: u8,
}

impl Hsv {
    /// Create a new HSV triple.
    #[must_use]
    pub const fn new(hue: u8, saturation: u8, value: u8) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }
}

/// A `width × height` grid of [`Hsv`] pixels in row-major order.
///
/// Produced once per run by [`to_hsv`](crate::hsv::to_hsv) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvImage {
    dimensions: Dimensions,
    pixels: Vec<Hsv>,
}

impl HsvImage {
    /// Build an image by evaluating `f` at every coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Hsv) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            dimensions: Dimensions::new(width, height),
            pixels,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds, like
    /// [`image::ImageBuffer::get_pixel`].
    #[must_use]
    pub fn get_pixel(&self, x: u32, y: u32) -> Hsv {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) out of bounds for {}",
            self.dimensions,
        );
        self.pixels[y as usize * self.width() as usize + x as usize]
    }

    /// All pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Hsv] {
        &self.pixels
    }
}

/// Inclusive HSV bounds describing the vegetation color region.
///
/// A pixel matches when every channel lies within
/// `lower..=upper` on that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    /// Inclusive lower bound.
    pub lower: Hsv,
    /// Inclusive upper bound.
    pub upper: Hsv,
}

impl ThresholdRange {
    /// Default lower bound: yellow-green hue, moderate saturation and value.
    pub const DEFAULT_LOWER: Hsv = Hsv::new(35, 40, 40);

    /// Default upper bound: cyan-green hue, full saturation and value.
    pub const DEFAULT_UPPER: Hsv = Hsv::new(85, 255, 255);

    /// Create a range from its bounds. Call [`validate`](Self::validate)
    /// before use if the bounds come from user input.
    #[must_use]
    pub const fn new(lower: Hsv, upper: Hsv) -> Self {
        Self { lower, upper }
    }

    /// Whether `pixel` falls inside the range on all three channels.
    #[must_use]
    pub const fn contains(&self, pixel: Hsv) -> bool {
        pixel.hue >= self.lower.hue
            && pixel.hue <= self.upper.hue
            && pixel.saturation >= self.lower.saturation
            && pixel.saturation <= self.upper.saturation
            && pixel.value >= self.lower.value
            && pixel.value <= self.upper.value
    }

    /// Check that each lower component is at most the upper one and that
    /// hue bounds do not exceed [`MAX_HUE`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidThreshold`] describing the first
    /// violated constraint.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let channels = [
            ("hue", self.lower.hue, self.upper.hue),
            ("saturation", self.lower.saturation, self.upper.saturation),
            ("value", self.lower.value, self.upper.value),
        ];
        for (name, lower, upper) in channels {
            if lower > upper {
                return Err(PipelineError::InvalidThreshold(format!(
                    "{name} lower bound {lower} exceeds upper bound {upper}"
                )));
            }
        }
        if self.upper.hue > MAX_HUE {
            return Err(PipelineError::InvalidThreshold(format!(
                "hue upper bound {} exceeds maximum {MAX_HUE}",
                self.upper.hue
            )));
        }
        Ok(())
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOWER, Self::DEFAULT_UPPER)
    }
}

/// How morphology treats pixels outside the image.
///
/// The default is [`Neutral`](Self::Neutral), not the stricter rule where
/// out-of-bounds pixels count as unset for erosion. Under that rule an
/// all-vegetation image would lose its edges and could never report
/// 100% coverage. `Neutral` matches OpenCV's default border handling.
/// Select [`Background`](Self::Background) for the strict rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderPolicy {
    /// Out-of-bounds pixels are ignored by both dilation and erosion.
    ///
    /// A fully-set mask is a fixed point under this policy.
    #[default]
    Neutral,

    /// Out-of-bounds pixels count as unset: dilation gains nothing from
    /// them and erosion clears any pixel whose neighborhood leaves the
    /// image.
    Background,
}

impl std::fmt::Display for BorderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Neutral => f.write_str("neutral"),
            Self::Background => f.write_str("background"),
        }
    }
}

/// Coverage of candidate pixels over the whole image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    /// `width * height` of the measured mask.
    pub total_pixels: u64,
    /// Number of set pixels in the mask.
    pub candidate_pixels: u64,
    /// `candidate_pixels / total_pixels * 100`, unrounded.
    pub percentage: f64,
}

impl Coverage {
    /// Percentage rounded to two decimal places, as reported.
    ///
    /// Rounds exactly like `{:.2}` formatting (ties to even on the exact
    /// binary value), so the CSV report, the summary and the diagnostics
    /// all show the same two decimals.
    #[must_use]
    pub fn rounded_percentage(&self) -> f64 {
        format!("{:.2}", self.percentage)
            .parse()
            .unwrap_or(self.percentage)
    }
}

/// Configuration for the detection pipeline.
///
/// All parameters have defaults matching the published color range and
/// the dilate-twice-then-erode-twice cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// HSV bounds a pixel must fall inside to be a vegetation candidate.
    pub threshold: ThresholdRange,

    /// Number of dilation passes, followed by the same number of erosion
    /// passes. Must be within `0..=`[`MAX_ITERATIONS`](Self::MAX_ITERATIONS).
    pub iterations: i32,

    /// Border handling for dilation and erosion.
    pub border_policy: BorderPolicy,

    /// Color written over detected pixels in the overlay, in the source
    /// image's channel order (RGB).
    pub highlight: [u8; 3],
}

impl PipelineConfig {
    /// Default morphology iteration count.
    pub const DEFAULT_ITERATIONS: i32 = 2;

    /// Largest accepted morphology iteration count.
    pub const MAX_ITERATIONS: i32 = 64;

    /// Default overlay color: pure green.
    pub const DEFAULT_HIGHLIGHT: [u8; 3] = [0, 255, 0];

    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidThreshold`] for malformed bounds
    /// and [`PipelineError::InvalidIteration`] for an out-of-range
    /// iteration count.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.threshold.validate()?;
        if !(0..=Self::MAX_ITERATIONS).contains(&self.iterations) {
            return Err(PipelineError::InvalidIteration(self.iterations));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdRange::default(),
            iterations: Self::DEFAULT_ITERATIONS,
            border_policy: BorderPolicy::default(),
            highlight: Self::DEFAULT_HIGHLIGHT,
        }
    }
}

/// Result of running the full detection pipeline.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Source image with detected vegetation recolored.
    pub overlay: RgbImage,
    /// Share of the image classified as vegetation.
    pub coverage: Coverage,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
///
/// Each field captures the output of one stage, for diagnostics and for
/// writing debug images such as the refined mask.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 0: decoded source image.
    pub original: RgbImage,
    /// Stage 1: HSV conversion of the source.
    pub hsv: HsvImage,
    /// Stage 2: raw threshold mask.
    pub raw_mask: Mask,
    /// Stage 3: mask after dilation and erosion.
    pub refined_mask: Mask,
    /// Stage 4: coverage of the refined mask.
    pub coverage: Coverage,
    /// Stage 5: source image with refined-mask pixels highlighted.
    pub overlay: RgbImage,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Drop the intermediates, keeping only what [`crate::process`]
    /// returns.
    #[must_use]
    pub fn into_detection(self) -> Detection {
        Detection {
            overlay: self.overlay,
            coverage: self.coverage,
            dimensions: self.dimensions,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The source image is empty, undecodable, or has a zero dimension.
    #[error("invalid image: {reason}")]
    InvalidImage {
        /// What was wrong with the image.
        reason: String,
    },

    /// The morphology iteration count is negative or too large.
    #[error(
        "invalid morphology iteration count {0}: must be between 0 and {max}",
        max = PipelineConfig::MAX_ITERATIONS
    )]
    InvalidIteration(i32),

    /// The HSV threshold bounds are malformed.
    #[error("invalid threshold range: {0}")]
    InvalidThreshold(String),

    /// Two rasters that must align have different sizes.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensions of the reference raster.
        expected: Dimensions,
        /// Dimensions of the raster that disagreed.
        actual: Dimensions,
    },

    /// Statistics were requested for a mask with no pixels.
    #[error("coverage is undefined for an image with zero pixels")]
    DivisionUndefined,
}

impl PipelineError {
    pub(crate) fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::invalid_image(format!("failed to decode image: {err}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Dimensions tests ---

    #[test]
    fn dimensions_pixel_count() {
        assert_eq!(Dimensions::new(640, 480).pixel_count(), 307_200);
        assert_eq!(Dimensions::new(0, 480).pixel_count(), 0);
    }

    #[test]
    fn dimensions_pixel_count_does_not_overflow_u32() {
        let d = Dimensions::new(u32::MAX, 2);
        assert_eq!(d.pixel_count(), u64::from(u32::MAX) * 2);
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(3, 7).to_string(), "3x7");
    }

    // --- HsvImage tests ---

    #[test]
    fn hsv_image_from_fn_is_row_major() {
        let img = HsvImage::from_fn(3, 2, |x, y| Hsv::new(u8::try_from(x + 10 * y).unwrap(), 0, 0));
        assert_eq!(img.get_pixel(2, 0).hue, 2);
        assert_eq!(img.get_pixel(0, 1).hue, 10);
        assert_eq!(img.pixels()[4].hue, 11);
        assert_eq!(img.dimensions(), Dimensions::new(3, 2));
    }

    // --- ThresholdRange tests ---

    #[test]
    fn threshold_defaults_match_published_range() {
        let range = ThresholdRange::default();
        assert_eq!(range.lower, Hsv::new(35, 40, 40));
        assert_eq!(range.upper, Hsv::new(85, 255, 255));
        assert!(range.validate().is_ok());
    }

    #[test]
    fn threshold_contains_is_inclusive() {
        let range = ThresholdRange::default();
        assert!(range.contains(range.lower));
        assert!(range.contains(range.upper));
        assert!(!range.contains(Hsv::new(34, 40, 40)));
        assert!(!range.contains(Hsv::new(86, 255, 255)));
        assert!(!range.contains(Hsv::new(60, 39, 200)));
    }

    #[test]
    fn threshold_lower_above_upper_is_rejected() {
        let range = ThresholdRange::new(Hsv::new(90, 40, 40), Hsv::new(85, 255, 255));
        let err = range.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid threshold range: hue lower bound 90 exceeds upper bound 85",
        );
    }

    #[test]
    fn threshold_hue_above_max_is_rejected() {
        let range = ThresholdRange::new(Hsv::new(35, 40, 40), Hsv::new(200, 255, 255));
        assert!(matches!(
            range.validate(),
            Err(PipelineError::InvalidThreshold(_))
        ));
    }

    // --- Coverage tests ---

    #[test]
    fn coverage_rounds_to_two_decimals() {
        let c = Coverage {
            total_pixels: 3,
            candidate_pixels: 1,
            percentage: 100.0 / 3.0,
        };
        assert!((c.rounded_percentage() - 33.33).abs() < 1e-9);
    }

    #[test]
    fn coverage_rounding_matches_two_decimal_formatting() {
        for (candidate_pixels, total_pixels) in [(1_u64, 800_u64), (1, 8), (3, 800), (1, 3), (2, 3)] {
            #[allow(clippy::cast_precision_loss)]
            let percentage = candidate_pixels as f64 / total_pixels as f64 * 100.0;
            let c = Coverage {
                total_pixels,
                candidate_pixels,
                percentage,
            };
            assert_eq!(
                format!("{:.2}", c.rounded_percentage()),
                format!("{percentage:.2}"),
                "{candidate_pixels}/{total_pixels}",
            );
        }
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold, ThresholdRange::default());
        assert_eq!(config.iterations, 2);
        assert_eq!(config.border_policy, BorderPolicy::Neutral);
        assert_eq!(config.highlight, [0, 255, 0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pipeline_config_negative_iterations_rejected() {
        let config = PipelineConfig {
            iterations: -1,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidIteration(-1))
        ));
    }

    #[test]
    fn pipeline_config_too_many_iterations_rejected() {
        let config = PipelineConfig {
            iterations: PipelineConfig::MAX_ITERATIONS + 1,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidIteration(65))
        ));
    }

    #[test]
    fn pipeline_config_serde_round_trip() {
        let config = PipelineConfig {
            threshold: ThresholdRange::new(Hsv::new(30, 50, 20), Hsv::new(90, 250, 250)),
            iterations: 3,
            border_policy: BorderPolicy::Background,
            highlight: [255, 0, 255],
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn pipeline_config_partial_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"iterations": 1}"#).unwrap();
        assert_eq!(config.iterations, 1);
        assert_eq!(config.threshold, ThresholdRange::default());
        assert_eq!(config.border_policy, BorderPolicy::Neutral);
    }

    #[test]
    fn border_policy_serializes_snake_case() {
        let json = serde_json::to_string(&BorderPolicy::Background).unwrap();
        assert_eq!(json, "\"background\"");
    }

    // --- PipelineError tests ---

    #[test]
    fn error_invalid_iteration_display() {
        let err = PipelineError::InvalidIteration(-3);
        assert_eq!(
            err.to_string(),
            "invalid morphology iteration count -3: must be between 0 and 64",
        );
    }

    #[test]
    fn error_dimension_mismatch_display() {
        let err = PipelineError::DimensionMismatch {
            expected: Dimensions::new(4, 4),
            actual: Dimensions::new(4, 5),
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 4x4, got 4x5");
    }

    #[test]
    fn error_division_undefined_display() {
        assert_eq!(
            PipelineError::DivisionUndefined.to_string(),
            "coverage is undefined for an image with zero pixels",
        );
    }
}
