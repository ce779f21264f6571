//! File output: overlay and mask images, CSV report.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use greenspace_export::{CoverageRecord, ExportError, RasterFormat, to_csv, to_csv_rows};

use crate::error::CliError;

/// Raster format implied by a path's extension.
///
/// # Errors
///
/// Returns [`ExportError::UnsupportedFormat`] for a missing or unknown
/// extension.
pub fn format_for(path: &Path) -> Result<RasterFormat, ExportError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    RasterFormat::from_extension(&ext)
}

/// Write `bytes` to `path`, replacing any existing file.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Write the coverage report.
///
/// With `append`, the row is added to an existing report; the header is
/// written only if the file is missing or empty. Without it, the report
/// is replaced.
pub fn write_report(path: &Path, record: &CoverageRecord<'_>, append: bool) -> Result<(), CliError> {
    let records = std::slice::from_ref(record);
    if !append {
        return write_file(path, to_csv(records).as_bytes());
    }

    let write_err = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    let is_empty = file.metadata().map_err(write_err)?.len() == 0;
    let contents = if is_empty {
        to_csv(records)
    } else {
        to_csv_rows(records)
    };
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    tracing::debug!(path = %path.display(), new_file = is_empty, "appended report row");
    Ok(())
}
