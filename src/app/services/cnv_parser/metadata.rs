//! CNV header metadata extraction
//!
//! Consumes classified header lines in order and recovers the global
//! attributes, the ordered variable declarations and the bad-flag sentinel.
//! Span and per-variable bad-flag declarations are resolved only once the
//! whole header has been read, so their position relative to the `name`
//! lines does not matter.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::dialect::Dialect;
use super::field_parsers::{
    format_datetime, normalize_key, parse_declaration, parse_nmea_coordinate, parse_number,
    parse_span, parse_start_time, split_variable_name,
};
use crate::app::models::{BadFlagSentinel, LineKind, RawLine, VariableSpec};
use crate::constants::attributes::{
    BAD_FLAG, COMMENTS, DATETIME, FILE_TYPE, INSTRUMENT_HEADER, INSTRUMENT_MODEL, LATITUDE,
    LONGITUDE, NMEA_LATITUDE, NMEA_LONGITUDE, NQUAN, NVALUES, START_TIME,
    UNKNOWN_LINE_PREFIX, UNRESOLVED_BAD_FLAG_PREFIX, UNRESOLVED_SPAN_PREFIX,
};
use crate::constants::{INSTRUMENT_SIGIL, PROCESSING_SIGIL, USER_SIGIL};
use crate::{Error, Result};

/// Everything the header section declares
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMetadata {
    /// Dialect the keywords were matched with
    pub dialect: Dialect,

    /// Normalized header attributes, including derived ones
    pub global_attributes: BTreeMap<String, String>,

    /// Variable declarations in column order
    pub variables: Vec<VariableSpec>,

    /// File-wide bad-flag sentinel
    pub bad_flag: Option<BadFlagSentinel>,

    /// `nquan` as declared by the processing software
    pub declared_nquan: Option<usize>,

    /// `nvalues` as declared by the processing software
    pub declared_nvalues: Option<usize>,
}

impl HeaderMetadata {
    /// Sentinel to apply to each column, per-variable override first
    pub fn sentinels(&self) -> Vec<Option<BadFlagSentinel>> {
        self.variables
            .iter()
            .map(|variable| {
                variable
                    .bad_flag
                    .map(BadFlagSentinel::new)
                    .or(self.bad_flag)
            })
            .collect()
    }
}

// `** Ship: Antares` versus `# interval = seconds: 0.5`
const USER_SEPARATORS: &[char] = &[':', '='];
const PROCESSING_SEPARATORS: &[char] = &['='];

/// A span or bad-flag declaration waiting for the full variable list
#[derive(Debug, Clone)]
struct PendingReference {
    line: usize,
    reference: Option<String>,
    value: String,
}

impl PendingReference {
    fn unresolved_key(&self, prefix: &str) -> String {
        let suffix = self
            .reference
            .as_deref()
            .map(normalize_key)
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| format!("line_{}", self.line));
        format!("{}{}", prefix, suffix)
    }
}

/// Incremental header consumer
#[derive(Debug)]
pub struct MetadataExtractor {
    dialect: Dialect,
    attributes: BTreeMap<String, String>,
    variables: Vec<VariableSpec>,
    bad_flag: Option<BadFlagSentinel>,
    pending_spans: Vec<PendingReference>,
    pending_bad_flags: Vec<PendingReference>,
}

impl MetadataExtractor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            attributes: BTreeMap::new(),
            variables: Vec::new(),
            bad_flag: None,
            pending_spans: Vec::new(),
            pending_bad_flags: Vec::new(),
        }
    }

    /// Consume a whole header and resolve it
    pub fn extract<'a>(
        dialect: Dialect,
        lines: impl IntoIterator<Item = RawLine<'a>>,
    ) -> Result<HeaderMetadata> {
        let mut extractor = Self::new(dialect);
        for line in lines {
            extractor.consume(&line)?;
        }
        extractor.finish()
    }

    /// Consume one classified line
    pub fn consume(&mut self, line: &RawLine<'_>) -> Result<()> {
        match line.kind {
            LineKind::InstrumentInfo => self.instrument_info(line.text),
            LineKind::UserComment => self.user_comment(line.text),
            LineKind::VariableDecl => self.variable_decl(line)?,
            LineKind::SpanDecl => self.span_decl(line),
            LineKind::BadFlagDecl => self.bad_flag_decl(line),
            LineKind::Unknown => {
                let key = format!("{}{}", UNKNOWN_LINE_PREFIX, line.number);
                insert_attribute(&mut self.attributes, key, line.text.trim_end());
            }
            LineKind::Sentinel | LineKind::Data => {}
        }
        Ok(())
    }

    /// Resolve pending references and derived attributes
    pub fn finish(mut self) -> Result<HeaderMetadata> {
        if let Some(file_type) = self.attributes.get(FILE_TYPE) {
            if file_type.trim().eq_ignore_ascii_case("binary") {
                return Err(Error::unsupported_file_type(file_type.trim()));
            }
        }

        for pending in std::mem::take(&mut self.pending_spans) {
            let index = self.resolve(pending.reference.as_deref());
            match (index, parse_span(&pending.value)) {
                (Some(index), Some(span)) => self.variables[index].span = Some(span),
                _ => {
                    warn!(
                        "Span on line {} ({:?} = '{}') not applied to any variable",
                        pending.line, pending.reference, pending.value
                    );
                    let key = pending.unresolved_key(UNRESOLVED_SPAN_PREFIX);
                    insert_attribute(&mut self.attributes, key, &pending.value);
                }
            }
        }

        for pending in std::mem::take(&mut self.pending_bad_flags) {
            let index = self.resolve(pending.reference.as_deref());
            match (index, parse_number(&pending.value)) {
                (Some(index), Some(value)) => self.variables[index].bad_flag = Some(value),
                _ => {
                    warn!(
                        "Bad flag on line {} ({:?} = '{}') not applied to any variable",
                        pending.line, pending.reference, pending.value
                    );
                    let key = pending.unresolved_key(UNRESOLVED_BAD_FLAG_PREFIX);
                    insert_attribute(&mut self.attributes, key, &pending.value);
                }
            }
        }

        self.derive_attributes();

        let declared_nquan = self.declared_count(NQUAN);
        let declared_nvalues = self.declared_count(NVALUES);

        if let Some(nquan) = declared_nquan {
            if nquan != self.variables.len() {
                warn!(
                    "Header declares nquan = {} but {} variables were named",
                    nquan,
                    self.variables.len()
                );
            }
        }

        debug!(
            "Extracted {} variables and {} attributes ({} dialect)",
            self.variables.len(),
            self.attributes.len(),
            self.dialect
        );

        Ok(HeaderMetadata {
            dialect: self.dialect,
            global_attributes: self.attributes,
            variables: self.variables,
            bad_flag: self.bad_flag,
            declared_nquan,
            declared_nvalues,
        })
    }

    fn instrument_info(&mut self, text: &str) {
        let body = text
            .trim_start()
            .trim_start_matches(INSTRUMENT_SIGIL)
            .trim();

        if let Some((key, value)) = body.split_once('=') {
            let key = normalize_key(key);
            if !key.is_empty() {
                insert_attribute(&mut self.attributes, key, value.trim());
                return;
            }
        }

        if !body.is_empty() {
            insert_attribute(&mut self.attributes, INSTRUMENT_HEADER.to_string(), body);
        }
    }

    fn user_comment(&mut self, text: &str) {
        let trimmed = text.trim_start();
        let (body, separators) = match trimmed.strip_prefix(USER_SIGIL) {
            Some(body) => (body, USER_SEPARATORS),
            None => (processing_body(trimmed), PROCESSING_SEPARATORS),
        };
        let body = body.trim();

        for separator in separators {
            if let Some((key, value)) = body.split_once(*separator) {
                let key = normalize_key(key);
                if !key.is_empty() {
                    insert_attribute(&mut self.attributes, key, value.trim());
                    return;
                }
            }
        }

        if !body.is_empty() {
            insert_attribute(&mut self.attributes, COMMENTS.to_string(), body);
        }
    }

    fn variable_decl(&mut self, line: &RawLine<'_>) -> Result<()> {
        let declaration = parse_declaration(processing_body(line.text));

        let value = declaration.value.ok_or_else(|| {
            Error::malformed_variable_decl(line.number, "missing '=' after the name keyword")
        })?;

        let parsed = split_variable_name(value).ok_or_else(|| {
            Error::malformed_variable_decl(
                line.number,
                format!("no variable name in '{}'", line.text.trim()),
            )
        })?;

        let ordinal = self.variables.len();
        if let Some(reference) = declaration.reference {
            match reference.parse::<usize>() {
                Ok(declared) if declared != ordinal => warn!(
                    "Line {} declares variable index {} but it is column {}",
                    line.number, declared, ordinal
                ),
                Ok(_) => {}
                Err(_) => debug!(
                    "Line {} has a non-numeric variable index '{}'",
                    line.number, reference
                ),
            }
        }

        let mut name = parsed.name;
        if self.has_variable(&name) {
            let mut renamed = format!("{}_{}", name, ordinal);
            while self.has_variable(&renamed) {
                renamed.push('_');
            }
            warn!(
                "Duplicate variable name '{}' on line {}, renamed to '{}'",
                name, line.number, renamed
            );
            name = renamed;
        }

        self.variables.push(VariableSpec {
            name,
            long_name: parsed.long_name,
            unit: parsed.unit,
            span: None,
            bad_flag: None,
            ordinal,
        });
        Ok(())
    }

    fn span_decl(&mut self, line: &RawLine<'_>) {
        let declaration = parse_declaration(processing_body(line.text));
        self.pending_spans.push(PendingReference {
            line: line.number,
            reference: declaration.reference.map(str::to_string),
            value: declaration.value.unwrap_or_default().to_string(),
        });
    }

    fn bad_flag_decl(&mut self, line: &RawLine<'_>) {
        let declaration = parse_declaration(processing_body(line.text));
        let value = declaration.value.unwrap_or_default();

        match declaration.reference {
            Some(reference) => self.pending_bad_flags.push(PendingReference {
                line: line.number,
                reference: Some(reference.to_string()),
                value: value.to_string(),
            }),
            None => {
                insert_attribute(&mut self.attributes, BAD_FLAG.to_string(), value);
                match parse_number(value) {
                    Some(sentinel) => self.bad_flag = Some(BadFlagSentinel::new(sentinel)),
                    None => warn!(
                        "Bad flag '{}' on line {} is not a number, no cells will be masked",
                        value, line.number
                    ),
                }
            }
        }
    }

    fn derive_attributes(&mut self) {
        let latitude = self
            .first_value(NMEA_LATITUDE)
            .and_then(parse_nmea_coordinate);
        let longitude = self
            .first_value(NMEA_LONGITUDE)
            .and_then(parse_nmea_coordinate);
        let datetime = self
            .first_value(START_TIME)
            .and_then(parse_start_time)
            .map(|datetime| format_datetime(&datetime));
        let model = self.dialect.model().map(str::to_string);

        let derived = [
            (LATITUDE, latitude.map(|v| v.to_string())),
            (LONGITUDE, longitude.map(|v| v.to_string())),
            (DATETIME, datetime),
            (INSTRUMENT_MODEL, model),
        ];

        for (key, value) in derived {
            if let Some(value) = value {
                self.attributes.entry(key.to_string()).or_insert(value);
            }
        }
    }

    fn first_value(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.lines().next())
    }

    fn declared_count(&self, key: &str) -> Option<usize> {
        self.first_value(key)?.trim().parse().ok()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|variable| variable.name == name)
    }

    fn resolve(&self, reference: Option<&str>) -> Option<usize> {
        let reference = reference?;
        if let Ok(ordinal) = reference.parse::<usize>() {
            return (ordinal < self.variables.len()).then_some(ordinal);
        }
        self.variables
            .iter()
            .position(|variable| variable.name == reference)
    }
}

fn processing_body(text: &str) -> &str {
    let trimmed = text.trim_start();
    trimmed.strip_prefix(PROCESSING_SIGIL).unwrap_or(trimmed)
}

/// Insert an attribute, joining repeated keys with a newline
fn insert_attribute(attributes: &mut BTreeMap<String, String>, key: String, value: &str) {
    attributes
        .entry(key)
        .and_modify(|existing| {
            existing.push('\n');
            existing.push_str(value);
        })
        .or_insert_with(|| value.to_string());
}
