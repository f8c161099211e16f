//! Data row decoding
//!
//! Parses each data line into exactly one cell per declared variable and
//! masks bad-flag sentinels. Rows with the wrong arity or a non-numeric token
//! are skipped and reported as [`RowIssue`]s instead of failing the file.

use serde::Serialize;
use tracing::{debug, warn};

use crate::app::models::{BadFlagSentinel, DataRow, RawLine};
use crate::config::ParserConfig;
use crate::constants::CNV_FIELD_WIDTH;

/// Recoverable problem with a single data line
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowIssue {
    /// Token count differs from the number of declared variables
    #[error("line {line}: expected {expected} values, found {found}")]
    ArityMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A token that is not a number
    #[error("line {line}: cannot parse '{token}' as a number")]
    ParseError { line: usize, token: String },
}

impl RowIssue {
    /// Line the issue was found on
    pub fn line(&self) -> usize {
        match self {
            RowIssue::ArityMismatch { line, .. } | RowIssue::ParseError { line, .. } => *line,
        }
    }
}

/// Output of decoding a data section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    /// Accepted rows in file order
    pub rows: Vec<DataRow>,

    /// Skipped rows, in file order
    pub issues: Vec<RowIssue>,

    /// Non-blank data lines seen
    pub data_lines: usize,
}

/// Decoder for one file's data section
#[derive(Debug, Clone)]
pub struct RowDecoder {
    sentinels: Vec<Option<BadFlagSentinel>>,
    epsilon: f64,
    fixed_width_fallback: bool,
}

impl RowDecoder {
    /// One sentinel slot per declared variable; the slot count is the arity
    pub fn new(sentinels: Vec<Option<BadFlagSentinel>>, config: &ParserConfig) -> Self {
        Self {
            sentinels,
            epsilon: config.bad_flag_epsilon,
            fixed_width_fallback: config.fixed_width_fallback,
        }
    }

    /// Expected number of cells per row
    pub fn columns(&self) -> usize {
        self.sentinels.len()
    }

    /// Decode every data line, skipping and recording bad rows
    pub fn decode<'a>(&self, lines: impl IntoIterator<Item = RawLine<'a>>) -> DecodedRows {
        let mut decoded = DecodedRows::default();

        for line in lines {
            match self.decode_line(&line) {
                Ok(Some(row)) => {
                    decoded.data_lines += 1;
                    decoded.rows.push(row);
                }
                Ok(None) => {}
                Err(issue) => {
                    decoded.data_lines += 1;
                    debug!("Skipped row: {}", issue);
                    decoded.issues.push(issue);
                }
            }
        }

        if !decoded.issues.is_empty() {
            warn!(
                "Skipped {} of {} data rows (first: {})",
                decoded.issues.len(),
                decoded.data_lines,
                decoded.issues[0]
            );
        }

        decoded
    }

    /// Decode one line; blank lines yield `Ok(None)`
    pub fn decode_line(&self, line: &RawLine<'_>) -> Result<Option<DataRow>, RowIssue> {
        if line.text.trim().is_empty() {
            return Ok(None);
        }

        let tokens = self.tokenize(line)?;
        let mut cells = Vec::with_capacity(tokens.len());

        for (column, token) in tokens.into_iter().enumerate() {
            let value = token.parse::<f64>().map_err(|_| RowIssue::ParseError {
                line: line.number,
                token: token.to_string(),
            })?;
            cells.push(self.mask(column, value));
        }

        Ok(Some(DataRow {
            line: line.number,
            cells,
        }))
    }

    fn tokenize<'a>(&self, line: &RawLine<'a>) -> Result<Vec<&'a str>, RowIssue> {
        let expected = self.columns();
        let tokens: Vec<&'a str> = line.text.split_whitespace().collect();

        if tokens.len() == expected {
            return Ok(tokens);
        }

        if self.fixed_width_fallback {
            if let Some(fields) = fixed_width_fields(line.text, expected) {
                debug!(
                    "Line {} re-split into {} fixed-width fields",
                    line.number, expected
                );
                return Ok(fields);
            }
        }

        Err(RowIssue::ArityMismatch {
            line: line.number,
            expected,
            found: tokens.len(),
        })
    }

    /// Non-finite values and sentinel matches become missing
    fn mask(&self, column: usize, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self.sentinels[column] {
            Some(sentinel) if sentinel.matches(value, self.epsilon) => None,
            _ => Some(value),
        }
    }
}

/// Split a line into `columns` fields of exactly `CNV_FIELD_WIDTH` characters
fn fixed_width_fields(text: &str, columns: usize) -> Option<Vec<&str>> {
    let text = text.trim_end();
    if columns == 0 || !text.is_ascii() || text.len() != columns * CNV_FIELD_WIDTH {
        return None;
    }

    let fields: Vec<&str> = (0..columns)
        .map(|i| text[i * CNV_FIELD_WIDTH..(i + 1) * CNV_FIELD_WIDTH].trim())
        .collect();

    fields
        .iter()
        .all(|field| !field.is_empty())
        .then_some(fields)
}
