//! Parsing statistics for CNV processing
//!
//! Counts gathered while decoding one file. Skipped rows are kept as
//! [`RowIssue`]s so callers can report exactly which lines were dropped.

use serde::Serialize;

use super::row_decoder::RowIssue;

/// Simple parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseStats {
    /// Header lines before the delimiter, blank lines included
    pub header_lines: usize,

    /// Non-blank lines after the delimiter
    pub data_lines: usize,

    /// Rows that made it into the dataset
    pub rows_accepted: usize,

    /// Rows dropped for arity or number format problems
    pub rows_skipped: usize,

    /// One entry per skipped row, in file order
    pub issues: Vec<RowIssue>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.data_lines == 0 {
            100.0
        } else {
            (self.rows_accepted as f64 / self.data_lines as f64) * 100.0
        }
    }

    /// True when no data row was skipped
    pub fn is_clean(&self) -> bool {
        self.rows_skipped == 0
    }
}
