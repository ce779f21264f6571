//! greenspace: detect vegetation in an image.
//!
//! Reads an image, highlights every pixel classified as vegetation,
//! and records the vegetation coverage percentage in a CSV report.
//!
//! # Usage
//!
//! ```text
//! greenspace [OPTIONS] <INPUT>
//! greenspace parque.jpg -o parque_verde.png -r resultado.csv --append
//! ```
//!
//! Results go to stdout; logs go to stderr (`-v`, or `RUST_LOG`).

#![allow(clippy::print_stdout)]

mod cli;
mod error;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use greenspace_export::{CoverageRecord, encode_mask, encode_rgb};
use greenspace_pipeline::diagnostics::{Clock, PipelineDiagnostics, process_staged_with_diagnostics};
use greenspace_pipeline::{Coverage, Dimensions};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// What a run produced, printed on stdout.
#[derive(Serialize)]
struct RunSummary<'a> {
    image: &'a Path,
    dimensions: Dimensions,
    coverage: Coverage,
    overlay: &'a Path,
    report: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a PipelineDiagnostics>,
}

impl std::fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Image:    {} ({})", self.image.display(), self.dimensions)?;
        writeln!(
            f,
            "Coverage: {:.2}% ({} of {} pixels)",
            self.coverage.percentage, self.coverage.candidate_pixels, self.coverage.total_pixels,
        )?;
        writeln!(f, "Overlay:  {}", self.overlay.display())?;
        write!(f, "Report:   {}", self.report.display())?;
        if let Some(mask) = self.mask {
            write!(f, "\nMask:     {}", mask.display())?;
        }
        if let Some(diagnostics) = self.diagnostics {
            write!(f, "\n\n{}", diagnostics.report())?;
        }
        Ok(())
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.pipeline_config()?;
    tracing::debug!(?config, "resolved configuration");

    // Resolve output formats up front so a bad extension fails before
    // any work is done.
    let overlay_path = cli.overlay_path();
    let overlay_format = output::format_for(&overlay_path)?;
    let mask_target: Option<(&PathBuf, _)> = cli
        .mask
        .as_ref()
        .map(|path| output::format_for(path).map(|format| (path, format)))
        .transpose()?;
    let report_path = cli.report_path();

    let image_bytes = std::fs::read(&cli.input).map_err(|source| CliError::Read {
        path: cli.input.clone(),
        source,
    })?;
    tracing::info!(
        image = %cli.input.display(),
        bytes = image_bytes.len(),
        "analyzing image"
    );

    let (staged, diagnostics) =
        process_staged_with_diagnostics(&image_bytes, &config, &StdClock)?;
    tracing::info!(
        coverage = staged.coverage.rounded_percentage(),
        elapsed_ms = diagnostics.total_duration.as_secs_f64() * 1000.0,
        "detection complete"
    );

    output::write_file(&overlay_path, &encode_rgb(&staged.overlay, overlay_format)?)?;
    if let Some((path, format)) = mask_target {
        output::write_file(path, &encode_mask(&staged.refined_mask, format)?)?;
    }

    let source = cli.input.display().to_string();
    let record = CoverageRecord::new(&source, &staged.coverage);
    output::write_report(&report_path, &record, cli.append)?;

    let summary = RunSummary {
        image: &cli.input,
        dimensions: staged.dimensions,
        coverage: staged.coverage,
        overlay: &overlay_path,
        report: &report_path,
        mask: mask_target.map(|(path, _)| path.as_path()),
        diagnostics: cli.diagnostics.then_some(&diagnostics),
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
