//! greenspace-export: Pure format serializers (sans-IO)
//!
//! Converts pipeline results into output formats: a CSV coverage report
//! and encoded raster images (PNG, JPEG, BMP) for the overlay and mask.

pub mod csv;
pub mod raster;

pub use csv::{CoverageRecord, HEADER, to_csv, to_csv_rows};
pub use raster::{ExportError, RasterFormat, encode_mask, encode_rgb};
