//! Utility functions for header field parsing
//!
//! Small, pure helpers shared by the tokenizer and the metadata extractor:
//! key normalization, `# keyword ref = value` splitting, variable name/unit
//! splitting, span parsing and the derived position/time attributes.

use chrono::NaiveDateTime;

use crate::app::models::Span;
use crate::constants::{ISO_DATETIME_FORMAT, START_TIME_FORMAT};

/// Pieces of a `# keyword [reference] [= value]` processing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub keyword: &'a str,
    pub reference: Option<&'a str>,
    pub value: Option<&'a str>,
}

/// Split the body of a `#` line (sigil already removed)
pub fn parse_declaration(body: &str) -> Declaration<'_> {
    let (lhs, value) = match body.split_once('=') {
        Some((lhs, rhs)) => (lhs, Some(rhs.trim())),
        None => (body, None),
    };

    let lhs = lhs.trim();
    let (keyword, reference) = match lhs.split_once(char::is_whitespace) {
        Some((keyword, rest)) => {
            let rest = rest.trim();
            (keyword, (!rest.is_empty()).then_some(rest))
        }
        None => (lhs, None),
    };

    Declaration {
        keyword,
        reference,
        value,
    }
}

/// Leading keyword token of a `#` line body, used for classification
pub fn leading_keyword(body: &str) -> &str {
    let body = body.trim_start();
    let end = body
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(body.len());
    &body[..end]
}

/// Lowercase a header key and collapse runs of non-alphanumerics into `_`
///
/// `"NMEA UTC (Time)"` becomes `"nmea_utc_time"`.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    key
}

/// A variable declaration split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableName {
    pub name: String,
    pub long_name: Option<String>,
    pub unit: Option<String>,
}

/// Split `t090C: Temperature [ITS-90, deg C]` into name, long name and unit
///
/// Without a colon the name is whatever precedes the bracketed unit. A
/// description that is only a number (`flag:  0.000e+00`) is the flag's
/// default value, not a long name. Returns `None` when no name token is
/// present.
pub fn split_variable_name(value: &str) -> Option<VariableName> {
    let value = value.trim();

    let (name, long_name, unit) = match value.split_once(':') {
        Some((name, description)) => {
            let (long_name, unit) = split_unit(description);
            let long_name = (!long_name.is_empty() && long_name.parse::<f64>().is_err())
                .then(|| long_name.to_string());
            (name.trim(), long_name, unit)
        }
        None => {
            let (name, unit) = split_unit(value);
            (name, None, unit)
        }
    };

    if name.is_empty() {
        return None;
    }

    Some(VariableName {
        name: name.to_string(),
        long_name,
        unit,
    })
}

/// Separate a trailing `[unit]`; `[]` yields `Some("")`, no brackets yields `None`
fn split_unit(text: &str) -> (&str, Option<String>) {
    let text = text.trim();
    if let Some(stripped) = text.strip_suffix(']') {
        if let Some(open) = stripped.rfind('[') {
            let unit = stripped[open + 1..].trim().to_string();
            return (stripped[..open].trim(), Some(unit));
        }
    }
    (text, None)
}

/// Parse `min, max` (comma and/or whitespace separated)
pub fn parse_span(value: &str) -> Option<Span> {
    let numbers: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::parse::<f64>)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match numbers.as_slice() {
        [a, b] if a.is_finite() && b.is_finite() => Some(Span::new(a.min(*b), a.max(*b))),
        _ => None,
    }
}

/// Parse a finite number, ignoring surrounding whitespace
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an NMEA header position (`17 54.87 S`) into decimal degrees
pub fn parse_nmea_coordinate(value: &str) -> Option<f64> {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();

    // Hemisphere may be separate or glued to the minutes (`54.87S`)
    let last = tokens.pop()?;
    let (last, hemisphere) = match last.chars().last()? {
        h @ ('N' | 'S' | 'E' | 'W' | 'n' | 's' | 'e' | 'w') => {
            (&last[..last.len() - 1], h.to_ascii_uppercase())
        }
        _ => return None,
    };
    if !last.is_empty() {
        tokens.push(last);
    }

    let (degrees, minutes) = match tokens.as_slice() {
        [degrees, minutes] => (degrees.parse::<f64>().ok()?, minutes.parse::<f64>().ok()?),
        [degrees] => (degrees.parse::<f64>().ok()?, 0.0),
        _ => return None,
    };
    if !(0.0..60.0).contains(&minutes) {
        return None;
    }

    let magnitude = degrees.abs() + minutes / 60.0;
    let signed = match hemisphere {
        'S' | 'W' => -magnitude,
        _ => magnitude,
    };
    Some(signed)
}

/// Parse `start_time = Jun 01 2015 10:12:11 [NMEA time, header]`
pub fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    let without_note = value.split('[').next()?;
    let collapsed = without_note.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&collapsed, START_TIME_FORMAT).ok()
}

/// Render a derived timestamp for the `datetime` attribute
pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(ISO_DATETIME_FORMAT).to_string()
}
