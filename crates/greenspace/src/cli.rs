//! Command-line arguments and their mapping onto [`PipelineConfig`].

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use greenspace_pipeline::{BorderPolicy, Hsv, PipelineConfig, ThresholdRange};

use crate::error::CliError;

/// Detect vegetation in an image.
///
/// Writes a copy of the image with vegetation highlighted and a CSV
/// report with the percentage of the image covered.
#[derive(Parser, Debug)]
#[command(name = "greenspace", version)]
pub struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    pub input: PathBuf,

    /// Output path for the highlighted image (png, jpg or bmp).
    ///
    /// Defaults to `<input stem>_verde.png` next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output path for the CSV report.
    ///
    /// Defaults to `resultado_<input stem>.csv` next to the input.
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Append a row to the report instead of overwriting it.
    #[arg(long)]
    pub append: bool,

    /// Also write the refined binary mask to this path.
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Lower hue bound (0-179).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_LOWER.hue)]
    pub hue_min: u8,

    /// Upper hue bound (0-179).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_UPPER.hue)]
    pub hue_max: u8,

    /// Lower saturation bound (0-255).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_LOWER.saturation)]
    pub sat_min: u8,

    /// Upper saturation bound (0-255).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_UPPER.saturation)]
    pub sat_max: u8,

    /// Lower value (brightness) bound (0-255).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_LOWER.value)]
    pub val_min: u8,

    /// Upper value (brightness) bound (0-255).
    #[arg(long, default_value_t = ThresholdRange::DEFAULT_UPPER.value)]
    pub val_max: u8,

    /// Dilation passes, followed by the same number of erosion passes.
    #[arg(
        short = 'k',
        long,
        default_value_t = PipelineConfig::DEFAULT_ITERATIONS,
        allow_negative_numbers = true
    )]
    pub iterations: i32,

    /// How morphology treats pixels outside the image.
    #[arg(long, value_enum, default_value_t = Border::Neutral)]
    pub border: Border,

    /// Highlight color as "R,G,B".
    #[arg(long, value_name = "R,G,B", default_value = "0,255,0")]
    pub highlight: String,

    /// Pipeline config as a JSON file.
    ///
    /// When provided, all threshold, iteration, border and highlight
    /// flags are ignored. Missing fields take their defaults.
    #[arg(long, conflicts_with = "config_json")]
    pub config: Option<PathBuf>,

    /// Pipeline config as an inline JSON string. Same rules as `--config`.
    #[arg(long)]
    pub config_json: Option<String>,

    /// Print per-stage timings and counts.
    #[arg(long)]
    pub diagnostics: bool,

    /// Print the result summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Border policy selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Border {
    /// Ignore out-of-bounds pixels.
    Neutral,
    /// Treat out-of-bounds pixels as background.
    Background,
}

impl From<Border> for BorderPolicy {
    fn from(border: Border) -> Self {
        match border {
            Border::Neutral => Self::Neutral,
            Border::Background => Self::Background,
        }
    }
}

impl Cli {
    /// Build a [`PipelineConfig`] from the arguments.
    ///
    /// A JSON config (file or inline) takes precedence over the
    /// individual flags.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for unreadable or malformed JSON and
    /// for a malformed highlight color.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, CliError> {
        if let Some(ref path) = self.config {
            let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            return serde_json::from_str(&json)
                .map_err(|e| CliError::Config(format!("{}: {e}", path.display())));
        }
        if let Some(ref json) = self.config_json {
            return serde_json::from_str(json)
                .map_err(|e| CliError::Config(format!("--config-json: {e}")));
        }

        Ok(PipelineConfig {
            threshold: ThresholdRange::new(
                Hsv::new(self.hue_min, self.sat_min, self.val_min),
                Hsv::new(self.hue_max, self.sat_max, self.val_max),
            ),
            iterations: self.iterations,
            border_policy: self.border.into(),
            highlight: parse_rgb(&self.highlight)
                .map_err(|e| CliError::Config(format!("--highlight: {e}")))?,
        })
    }

    /// Overlay output path, explicit or derived from the input.
    #[must_use]
    pub fn overlay_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| sibling(&self.input, |stem| format!("{stem}_verde.png")))
    }

    /// Report output path, explicit or derived from the input.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| sibling(&self.input, |stem| format!("resultado_{stem}.csv")))
    }
}

/// A file next to `input` whose name is built from the input's stem.
fn sibling(input: &Path, name: impl FnOnce(&str) -> String) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "imagen".into(), |s| s.to_string_lossy());
    input.with_file_name(name(&stem))
}

/// Parse `"R,G,B"` into three bytes.
fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected 'R,G,B', got '{s}'"));
    };
    let channel = |c: &str| {
        c.parse::<u8>()
            .map_err(|e| format!("invalid channel '{c}': {e}"))
    };
    Ok([channel(r)?, channel(g)?, channel(b)?])
}
