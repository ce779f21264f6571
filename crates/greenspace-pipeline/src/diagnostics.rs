//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are intended for threshold tuning and for checking
//! how much the morphology pass changes a mask. Time is read through the
//! [`Clock`] trait so this crate stays free of any particular time
//! source; the CLI supplies one backed by [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{BorderPolicy, Hsv, PipelineConfig, PipelineError, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 0: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 1: HSV conversion.
    pub convert: StageDiagnostics,
    /// Stage 2: range thresholding.
    pub threshold: StageDiagnostics,
    /// Stage 3: dilation then erosion.
    pub refine: StageDiagnostics,
    /// Stage 4: coverage statistics.
    pub measure: StageDiagnostics,
    /// Stage 5: overlay rendering.
    pub render: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// HSV conversion metrics.
    Convert {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Thresholding metrics.
    Threshold {
        /// Inclusive lower bound used.
        lower: Hsv,
        /// Inclusive upper bound used.
        upper: Hsv,
        /// Candidates in the raw mask.
        candidate_pixel_count: u64,
    },
    /// Morphology metrics.
    Refine {
        /// Dilation (and erosion) pass count.
        iterations: i32,
        /// Border handling used.
        border_policy: BorderPolicy,
        /// Candidates before refinement.
        candidates_before: u64,
        /// Candidates after refinement.
        candidates_after: u64,
    },
    /// Coverage metrics.
    Measure {
        /// Unrounded coverage percentage.
        percentage: f64,
    },
    /// Overlay metrics.
    Render {
        /// Pixels replaced by the highlight color.
        highlighted_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Candidates in the raw mask.
    pub raw_candidates: u64,
    /// Candidates in the refined mask.
    pub refined_candidates: u64,
    /// Coverage rounded to two decimals.
    pub coverage_percentage: f64,
}

/// Run the pipeline like [`crate::process_staged`], timing each stage.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &PipelineConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let start = clock.now();

    let t = clock.now();
    let image = crate::decode::decode(image_bytes)?;
    let (width, height) = image.dimensions();
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width,
            height,
            pixel_count: u64::from(width) * u64::from(height),
        },
    };

    let t = clock.now();
    let converted = Pipeline::new(image, config.clone()).convert()?;
    let convert = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Convert { width, height },
    };

    let t = clock.now();
    let thresholded = converted.threshold();
    let raw_candidates = thresholded.raw_mask().count_set();
    let threshold = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Threshold {
            lower: config.threshold.lower,
            upper: config.threshold.upper,
            candidate_pixel_count: raw_candidates,
        },
    };

    let t = clock.now();
    let refined = thresholded.refine()?;
    let refined_candidates = refined.refined_mask().count_set();
    let refine = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Refine {
            iterations: config.iterations,
            border_policy: config.border_policy,
            candidates_before: raw_candidates,
            candidates_after: refined_candidates,
        },
    };

    let t = clock.now();
    let measured = refined.measure()?;
    let percentage = measured.coverage().percentage;
    let measure = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Measure { percentage },
    };

    let t = clock.now();
    let staged = measured.render()?.into_result();
    let render = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: StageMetrics::Render {
            highlighted_pixel_count: refined_candidates,
        },
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        convert,
        threshold,
        refine,
        measure,
        render,
        total_duration: clock.elapsed(&start),
        summary: PipelineSummary {
            image_width: width,
            image_height: height,
            pixel_count: staged.coverage.total_pixels,
            raw_candidates,
            refined_candidates,
            coverage_percentage: staged.coverage.rounded_percentage(),
        },
    };

    Ok((staged, diagnostics))
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Decode", &self.decode),
            ("Convert", &self.convert),
            ("Threshold", &self.threshold),
            ("Refine", &self.refine),
            ("Measure", &self.measure),
            ("Render", &self.render),
        ];

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Candidates: raw={}  refined={}  |  Coverage: {:.2}%",
            self.summary.raw_candidates,
            self.summary.refined_candidates,
            self.summary.coverage_percentage,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Convert { width, height } => format!("{width}x{height}"),
        StageMetrics::Threshold {
            lower,
            upper,
            candidate_pixel_count,
        } => format!(
            "H {}-{} S {}-{} V {}-{} candidates={candidate_pixel_count}",
            lower.hue, upper.hue, lower.saturation, upper.saturation, lower.value, upper.value,
        ),
        StageMetrics::Refine {
            iterations,
            border_policy,
            candidates_before,
            candidates_after,
        } => format!(
            "k={iterations} border={border_policy} {candidates_before}->{candidates_after}"
        ),
        StageMetrics::Measure { percentage } => format!("{percentage:.4}%"),
        StageMetrics::Render {
            highlighted_pixel_count,
        } => format!("highlighted={highlighted_pixel_count}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.0.get() - since)
        }
    }

    fn encode_png(img: &image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_track_candidate_counts() {
        // Left column green, rest gray.
        let img = image::RgbImage::from_fn(6, 4, |x, _| {
            if x == 0 {
                image::Rgb([20, 200, 20])
            } else {
                image::Rgb([90, 90, 90])
            }
        });
        let bytes = encode_png(&img);
        let clock = TickClock(Cell::new(0));
        let (staged, diag) =
            process_staged_with_diagnostics(&bytes, &PipelineConfig::default(), &clock).unwrap();

        assert_eq!(diag.summary.pixel_count, 24);
        assert_eq!(diag.summary.raw_candidates, 4);
        assert_eq!(diag.summary.refined_candidates, staged.refined_mask.count_set());
        assert!(diag.total_duration > Duration::ZERO);
        assert!(matches!(
            diag.decode.metrics,
            StageMetrics::Decode { width: 6, height: 4, .. }
        ));
    }

    #[test]
    fn diagnostics_propagate_errors() {
        let clock = TickClock(Cell::new(0));
        let result = process_staged_with_diagnostics(&[], &PipelineConfig::default(), &clock);
        assert!(matches!(result, Err(PipelineError::InvalidImage { .. })));
    }

    #[test]
    fn report_and_json_are_produced() {
        let img = image::RgbImage::from_pixel(3, 3, image::Rgb([20, 200, 20]));
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            process_staged_with_diagnostics(&encode_png(&img), &PipelineConfig::default(), &clock)
                .unwrap();

        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("Refine"));
        assert!(report.contains("Coverage: 100.00%"));

        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.refined_candidates, 9);
    }
}
