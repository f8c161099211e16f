//! Data models for CNV processing
//!
//! This module contains the structures produced while parsing a CNV file
//! (classified header lines, variable declarations, decoded rows) and the
//! immutable [`Dataset`] that outlives the parse.

use crate::app::services::cnv_parser::ParseStats;
use crate::constants::attributes;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// =============================================================================
// Tokenized Lines
// =============================================================================

/// Classification of a single input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    /// `* ...` written by the acquisition software
    InstrumentInfo,
    /// `** ...` typed by the operator, or a `#` line without a known keyword
    UserComment,
    /// `# name <n> = ...`
    VariableDecl,
    /// `# span <n> = ...`
    SpanDecl,
    /// `# bad_flag = ...`
    BadFlagDecl,
    /// The `*END*` delimiter
    Sentinel,
    /// Header line matching no sigil rule
    Unknown,
    /// Line after the delimiter
    Data,
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineKind::InstrumentInfo => "instrument-info",
            LineKind::UserComment => "user-comment",
            LineKind::VariableDecl => "variable-decl",
            LineKind::SpanDecl => "span-decl",
            LineKind::BadFlagDecl => "bad-flag-decl",
            LineKind::Sentinel => "sentinel",
            LineKind::Unknown => "unknown",
            LineKind::Data => "data",
        };
        f.write_str(name)
    }
}

/// One classified line of input, borrowed from the file text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine<'a> {
    /// 0-based line number in the file
    pub number: usize,
    /// Line text without the trailing newline
    pub text: &'a str,
    /// Classification tag
    pub kind: LineKind,
}

// =============================================================================
// Variable Declarations
// =============================================================================

/// Declared physical range of a variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` lies inside the span, bounds included
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.min, self.max)
    }
}

/// A variable declared in the CNV header
///
/// Created by the metadata extractor and never mutated once the header
/// section has been consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Short name, unique within the file (e.g. `t090C`)
    pub name: String,

    /// Descriptive name following the colon (e.g. `Temperature`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,

    /// Bracketed unit. `None` when no brackets were present, `Some("")` for `[]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Declared span, used for sanity checks only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,

    /// Per-variable bad flag overriding the file-wide sentinel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_flag: Option<f64>,

    /// 0-based column index in every data row
    pub ordinal: usize,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            long_name: None,
            unit: None,
            span: None,
            bad_flag: None,
            ordinal,
        }
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attributes for display, in a fixed order, skipping absent fields
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![("ordinal", self.ordinal.to_string())];
        if let Some(long_name) = &self.long_name {
            attrs.push(("long_name", long_name.clone()));
        }
        if let Some(unit) = &self.unit {
            attrs.push(("units", unit.clone()));
        }
        if let Some(span) = &self.span {
            attrs.push(("span", span.to_string()));
        }
        if let Some(bad_flag) = self.bad_flag {
            attrs.push(("bad_flag", bad_flag.to_string()));
        }
        attrs
    }
}

// =============================================================================
// Bad Flag
// =============================================================================

/// Numeric value the instrument writes in place of a real measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadFlagSentinel(f64);

impl BadFlagSentinel {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Relative comparison; a zero sentinel only matches exactly
    pub fn matches(&self, value: f64, epsilon: f64) -> bool {
        let sentinel = self.0;
        if sentinel == 0.0 {
            return value == 0.0;
        }
        (value - sentinel).abs() <= epsilon * sentinel.abs()
    }
}

// =============================================================================
// Decoded Data
// =============================================================================

/// One decoded data line, `None` cells are missing values
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    /// 0-based line number the row was read from
    pub line: usize,
    pub cells: Vec<Option<f64>>,
}

/// A variable together with its decoded column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub spec: VariableSpec,

    /// One entry per accepted data row, `None` for missing
    pub values: Vec<Option<f64>>,

    /// Number of present values outside the declared span
    pub out_of_span: usize,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Present values only, in row order
    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Immutable result of parsing one CNV file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    global_attributes: BTreeMap<String, String>,
    variables: Vec<Variable>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    stats: ParseStats,
}

impl Dataset {
    /// Build a dataset, checking name uniqueness and column lengths
    pub fn new(
        global_attributes: BTreeMap<String, String>,
        variables: Vec<Variable>,
        stats: ParseStats,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(variables.len());
        for (position, variable) in variables.iter().enumerate() {
            if index.insert(variable.spec.name.clone(), position).is_some() {
                return Err(Error::assembly(format!(
                    "Duplicate variable name '{}'",
                    variable.spec.name
                )));
            }
        }

        if let Some(first) = variables.first() {
            let expected = first.values.len();
            if let Some(bad) = variables.iter().find(|v| v.values.len() != expected) {
                return Err(Error::assembly(format!(
                    "Variable '{}' has {} values, '{}' has {}",
                    bad.spec.name,
                    bad.values.len(),
                    first.spec.name,
                    expected
                )));
            }
        }

        Ok(Self {
            global_attributes,
            variables,
            index,
            stats,
        })
    }

    /// Global attribute names, sorted lexicographically
    pub fn global_attribute_names(&self) -> Vec<&str> {
        self.global_attributes.keys().map(String::as_str).collect()
    }

    pub fn global_attribute(&self, name: &str) -> Option<&str> {
        self.global_attributes.get(name).map(String::as_str)
    }

    pub fn global_attributes(&self) -> &BTreeMap<String, String> {
        &self.global_attributes
    }

    /// Variable names in declaration order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(Variable::name).collect()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&position| &self.variables[position])
    }

    /// Variables in declaration order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of accepted data rows
    pub fn row_count(&self) -> usize {
        self.stats.rows_accepted
    }

    /// Number of data rows skipped by the decoder
    pub fn skipped_rows(&self) -> usize {
        self.stats.rows_skipped
    }

    /// Detected dialect name
    pub fn dialect(&self) -> Option<&str> {
        self.global_attribute(attributes::DIALECT)
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, ordinal: usize, values: Vec<Option<f64>>) -> Variable {
        Variable {
            spec: VariableSpec::new(name, ordinal),
            values,
            out_of_span: 0,
        }
    }

    #[test]
    fn test_bad_flag_relative_match() {
        let sentinel = BadFlagSentinel::new(-9.990e-29);
        assert!(sentinel.matches(-9.99e-29, 1e-6));
        assert!(sentinel.matches(-9.990_000_1e-29, 1e-6));
        assert!(!sentinel.matches(-9.98e-29, 1e-6));
        assert!(!sentinel.matches(0.0, 1e-6));

        let zero = BadFlagSentinel::new(0.0);
        assert!(zero.matches(0.0, 1e-6));
        assert!(!zero.matches(1e-300, 1e-6));
    }

    #[test]
    fn test_span_contains_bounds() {
        let span = Span::new(-2.0, 35.0);
        assert!(span.contains(-2.0));
        assert!(span.contains(35.0));
        assert!(!span.contains(35.01));
        assert_eq!(span.to_string(), "-2, 35");
    }

    #[test]
    fn test_spec_attributes_skip_absent_fields() {
        let spec = VariableSpec::new("prDM", 2).with_unit("db");
        let attrs = spec.attributes();
        assert_eq!(
            attrs,
            vec![("ordinal", "2".to_string()), ("units", "db".to_string())]
        );
    }

    #[test]
    fn test_dataset_queries() {
        let mut attrs = BTreeMap::new();
        attrs.insert("ship".to_string(), "Antares".to_string());
        attrs.insert("dialect".to_string(), "generic".to_string());

        let dataset = Dataset::new(
            attrs,
            vec![
                variable("PRES", 0, vec![Some(1.0), None]),
                variable("TEMP", 1, vec![Some(20.0), Some(20.1)]),
            ],
            ParseStats::default(),
        )
        .unwrap();

        assert_eq!(dataset.global_attribute_names(), vec!["dialect", "ship"]);
        assert_eq!(dataset.global_attribute("ship"), Some("Antares"));
        assert_eq!(dataset.global_attribute("station"), None);
        assert_eq!(dataset.variable_names(), vec!["PRES", "TEMP"]);
        assert_eq!(dataset.variable("PRES").unwrap().missing_count(), 1);
        assert!(dataset.variable("COND").is_none());
        assert_eq!(dataset.dialect(), Some("generic"));
    }

    #[test]
    fn test_dataset_rejects_ragged_columns() {
        let result = Dataset::new(
            BTreeMap::new(),
            vec![
                variable("PRES", 0, vec![Some(1.0)]),
                variable("TEMP", 1, vec![]),
            ],
            ParseStats::default(),
        );
        assert!(matches!(result, Err(Error::Assembly { .. })));
    }

    #[test]
    fn test_dataset_rejects_duplicate_names() {
        let result = Dataset::new(
            BTreeMap::new(),
            vec![variable("PRES", 0, vec![]), variable("PRES", 1, vec![])],
            ParseStats::default(),
        );
        assert!(matches!(result, Err(Error::Assembly { .. })));
    }
}
