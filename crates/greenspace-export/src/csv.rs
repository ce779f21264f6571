//! CSV coverage report serializer.
//!
//! One row per analyzed image, with a stable two-column header:
//!
//! ```text
//! imagen,porcentaje_verde
//! parque.png,42.17
//! ```
//!
//! The percentage is always written with exactly two decimals. Source
//! identifiers containing a comma, double quote, or line break are
//! quoted and inner quotes doubled (RFC 4180).
//!
//! Pure functions with no I/O; callers get a `String` back.

use std::fmt::Write;

use greenspace_pipeline::Coverage;

/// Header line of every report, without the trailing newline.
pub const HEADER: &str = "imagen,porcentaje_verde";

/// One report row.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRecord<'a> {
    /// Identifier of the analyzed image, usually its path.
    pub source: &'a str,
    /// Coverage percentage; rounded to two decimals when written.
    pub percentage: f64,
}

impl<'a> CoverageRecord<'a> {
    /// Build a record from a pipeline [`Coverage`].
    #[must_use]
    pub const fn new(source: &'a str, coverage: &Coverage) -> Self {
        Self {
            source,
            percentage: coverage.percentage,
        }
    }
}

/// Serialize records into a complete CSV document, header included.
///
/// # Examples
///
/// ```
/// use greenspace_export::csv::{CoverageRecord, to_csv};
///
/// let rows = [CoverageRecord { source: "parque.png", percentage: 12.346 }];
/// assert_eq!(to_csv(&rows), "imagen,porcentaje_verde\nparque.png,12.35\n");
/// ```
#[must_use]
pub fn to_csv(records: &[CoverageRecord<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{HEADER}");
    out.push_str(&to_csv_rows(records));
    out
}

/// Serialize records as data rows only, for appending to an existing
/// report.
#[must_use]
pub fn to_csv_rows(records: &[CoverageRecord<'_>]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{},{:.2}",
            escape_field(record.source),
            record.percentage
        );
    }
    out
}

/// Quote a field if it contains a delimiter, quote, or line break.
fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
