//! netCDF data model shared by the writer and the reader
//!
//! Plain owned mirrors of the `netcdf3` header types, so callers and the
//! `dump` command never hold borrows into a reader, plus the name rules
//! applied to CNV variable names on export.

use std::fmt;

use netcdf3::DataType;

/// External data types of the classic format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcType {
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
}

impl NcType {
    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            NcType::Byte | NcType::Char => 1,
            NcType::Short => 2,
            NcType::Int | NcType::Float => 4,
            NcType::Double => 8,
        }
    }
}

impl From<DataType> for NcType {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::I8 => NcType::Byte,
            DataType::U8 => NcType::Char,
            DataType::I16 => NcType::Short,
            DataType::I32 => NcType::Int,
            DataType::F32 => NcType::Float,
            DataType::F64 => NcType::Double,
        }
    }
}

/// Attribute payload; text maps to `NC_CHAR`, numbers to `NC_DOUBLE`
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Numbers(Vec<f64>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Numbers(_) => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            AttributeValue::Numbers(numbers) => Some(numbers),
            AttributeValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::Numbers(numbers) => {
                let rendered: Vec<String> = numbers.iter().map(f64::to_string).collect();
                f.write_str(&rendered.join(", "))
            }
        }
    }
}

/// Named attribute, global or attached to a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Text(value.into()),
        }
    }

    pub fn numbers(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Numbers(values),
        }
    }

    /// Copy an attribute out of a `netcdf3` header
    ///
    /// `NC_CHAR` becomes text, every numeric type is widened to `f64`.
    pub(crate) fn from_header(attribute: &netcdf3::Attribute) -> Self {
        let name = attribute.name().to_string();
        let widened: Option<Vec<f64>> = match attribute.data_type() {
            DataType::U8 => {
                let text = attribute
                    .get_u8()
                    .map(|bytes| decode_text(bytes))
                    .unwrap_or_default();
                return Self::text(name, text);
            }
            DataType::I8 => attribute
                .get_i8()
                .map(|v| v.iter().map(|&x| f64::from(x)).collect()),
            DataType::I16 => attribute
                .get_i16()
                .map(|v| v.iter().map(|&x| f64::from(x)).collect()),
            DataType::I32 => attribute
                .get_i32()
                .map(|v| v.iter().map(|&x| f64::from(x)).collect()),
            DataType::F32 => attribute
                .get_f32()
                .map(|v| v.iter().map(|&x| f64::from(x)).collect()),
            DataType::F64 => attribute.get_f64().map(<[f64]>::to_vec),
        };
        Self::numbers(name, widened.unwrap_or_default())
    }
}

/// Named dimension; the record dimension grows with the number of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub length: usize,
    pub is_record: bool,
}

/// `NC_CHAR` payload with trailing NUL padding removed
pub(crate) fn decode_text(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Make a CNV name usable as a netCDF name
///
/// Keeps ASCII alphanumerics and `_-.+@`, replaces everything else with `_`
/// and prefixes names that do not start with a letter, digit or underscore.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.chars().next() {
        None => sanitized.push_str("unnamed"),
        Some(first) if !(first.is_ascii_alphanumeric() || first == '_') => {
            sanitized.insert_str(0, "v_")
        }
        Some(_) => {}
    }
    sanitized
}
