//! Dataset assembly
//!
//! Zips the variable declarations against the decoded rows, adds the derived
//! global attributes and runs the span sanity check.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::metadata::HeaderMetadata;
use super::row_decoder::DecodedRows;
use super::stats::ParseStats;
use crate::app::models::{Dataset, Variable};
use crate::constants::attributes::{DIALECT, HEADER_VALUE_PREFIX, ROW_COUNT, SKIPPED_ROW_COUNT};
use crate::{Error, Result};

/// Build the immutable dataset from header metadata and decoded rows
pub fn assemble(
    metadata: HeaderMetadata,
    decoded: DecodedRows,
    header_lines: usize,
) -> Result<Dataset> {
    let HeaderMetadata {
        dialect,
        mut global_attributes,
        variables: specs,
        declared_nvalues,
        ..
    } = metadata;

    let columns = specs.len();
    let mut columns_data: Vec<Vec<Option<f64>>> = (0..columns)
        .map(|_| Vec::with_capacity(decoded.rows.len()))
        .collect();

    for row in &decoded.rows {
        if row.cells.len() != columns {
            return Err(Error::assembly(format!(
                "Row from line {} has {} cells, expected {}",
                row.line,
                row.cells.len(),
                columns
            )));
        }
        for (column, cell) in columns_data.iter_mut().zip(&row.cells) {
            column.push(*cell);
        }
    }

    let variables: Vec<Variable> = specs
        .into_iter()
        .zip(columns_data)
        .map(|(spec, values)| {
            let out_of_span = match &spec.span {
                Some(span) => values
                    .iter()
                    .flatten()
                    .filter(|value| !span.contains(**value))
                    .count(),
                None => 0,
            };
            if out_of_span > 0 {
                warn!(
                    "{} values of '{}' fall outside the declared span [{}]",
                    out_of_span, spec.name, spec.span.map(|s| s.to_string()).unwrap_or_default()
                );
            }
            Variable {
                spec,
                values,
                out_of_span,
            }
        })
        .collect();

    let rows_accepted = decoded.rows.len();
    let rows_skipped = decoded.issues.len();

    if let Some(nvalues) = declared_nvalues {
        if nvalues != rows_accepted + rows_skipped {
            warn!(
                "Header declares nvalues = {} but the data section holds {} rows",
                nvalues,
                rows_accepted + rows_skipped
            );
        }
    }

    insert_derived(&mut global_attributes, ROW_COUNT, rows_accepted.to_string());
    insert_derived(&mut global_attributes, SKIPPED_ROW_COUNT, rows_skipped.to_string());
    insert_derived(&mut global_attributes, DIALECT, dialect.name().to_string());

    let stats = ParseStats {
        header_lines,
        data_lines: decoded.data_lines,
        rows_accepted,
        rows_skipped,
        issues: decoded.issues,
    };

    debug!(
        "Assembled {} variables x {} rows ({} skipped)",
        variables.len(),
        rows_accepted,
        rows_skipped
    );

    Dataset::new(global_attributes, variables, stats)
}

/// Insert a parser-derived attribute, moving a header value under the same key aside
fn insert_derived(attributes: &mut BTreeMap<String, String>, key: &str, value: String) {
    if let Some(header_value) = attributes.insert(key.to_string(), value) {
        let moved = format!("{}{}", HEADER_VALUE_PREFIX, key);
        warn!(
            "Header attribute '{}' clashes with a derived attribute, kept as '{}'",
            key, moved
        );
        attributes.insert(moved, header_value);
    }
}
