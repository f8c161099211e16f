//! netCDF classic reader
//!
//! Reads CDF-1 and CDF-2 files back into memory through `netcdf3`. Used to
//! verify exports and by the `dump` command for `.nc` inputs.

use std::fs;
use std::path::Path;

use netcdf3::{DataVector, FileReader, Version};
use tracing::debug;

use super::format::{Attribute, AttributeValue, Dimension, NcType, decode_text};
use crate::constants::netcdf::{FILL_VALUE_ATTR, NC_FILL_DOUBLE};
use crate::{Error, Result};

/// Decoded contents of a variable
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// Every numeric type, widened to `f64`
    Numeric(Vec<f64>),
    /// `NC_CHAR` data
    Text(String),
}

/// Variable read from a netCDF file
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVariable {
    pub name: String,
    /// Dimension names, outermost first
    pub dimensions: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub nc_type: NcType,
    pub data: ArrayData,
}

impl ArrayVariable {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        find_attribute(&self.attributes, name)
    }

    /// Numeric values with fill values (and NaN) mapped to `None`
    pub fn masked_values(&self) -> Option<Vec<Option<f64>>> {
        let ArrayData::Numeric(values) = &self.data else {
            return None;
        };

        let fill = self
            .attribute(FILL_VALUE_ATTR)
            .and_then(AttributeValue::as_numbers)
            .and_then(|numbers| numbers.first().copied())
            .unwrap_or(NC_FILL_DOUBLE);

        Some(
            values
                .iter()
                .map(|&value| (!value.is_nan() && value != fill).then_some(value))
                .collect(),
        )
    }
}

/// In-memory view of a netCDF classic file
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayFile {
    /// 1 for classic, 2 for 64-bit offset
    pub version: u8,
    pub dimensions: Vec<Dimension>,
    pub attributes: Vec<Attribute>,
    pub variables: Vec<ArrayVariable>,
}

impl ArrayFile {
    pub fn global_attribute(&self, name: &str) -> Option<&AttributeValue> {
        find_attribute(&self.attributes, name)
    }

    pub fn variable(&self, name: &str) -> Option<&ArrayVariable> {
        self.variables.iter().find(|variable| variable.name == name)
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a AttributeValue> {
    attributes
        .iter()
        .find(|attribute| attribute.name == name)
        .map(|attribute| &attribute.value)
}

/// Read a netCDF classic file
///
/// Header counts are checked against the file size before any variable is
/// loaded, so a corrupt header fails with [`Error::ArrayFormat`] instead of
/// requesting an impossible allocation.
pub fn read_netcdf(path: &Path) -> Result<ArrayFile> {
    let file_len = fs::metadata(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?
        .len();
    let mut reader = FileReader::open(path).map_err(|e| {
        Error::array_format(format!("{} is not a netCDF file: {:?}", path.display(), e))
    })?;

    let version = match reader.version() {
        Version::Classic => 1,
        Version::Offset64Bit => 2,
    };

    let data_set = reader.data_set();
    let dimensions: Vec<Dimension> = data_set
        .get_dims()
        .iter()
        .map(|dim| Dimension {
            name: dim.name().to_string(),
            length: dim.size(),
            is_record: dim.is_unlimited(),
        })
        .collect();
    let attributes: Vec<Attribute> = data_set
        .get_global_attrs()
        .into_iter()
        .map(Attribute::from_header)
        .collect();
    let headers: Vec<(String, Vec<String>, Vec<Attribute>, NcType)> = data_set
        .get_vars()
        .into_iter()
        .map(|var| {
            (
                var.name().to_string(),
                var.dim_names(),
                var.get_attrs().into_iter().map(Attribute::from_header).collect(),
                NcType::from(var.data_type()),
            )
        })
        .collect();

    let mut variables = Vec::with_capacity(headers.len());
    for (name, dimension_names, var_attributes, nc_type) in headers {
        check_extent(&name, &dimension_names, nc_type, &dimensions, file_len)?;
        let values = reader.read_var(&name).map_err(|e| {
            Error::array_format(format!("Failed to read variable {}: {:?}", name, e))
        })?;
        variables.push(ArrayVariable {
            name,
            dimensions: dimension_names,
            attributes: var_attributes,
            nc_type,
            data: array_data(values),
        });
    }

    debug!(
        "Read {} variables from {} (CDF-{})",
        variables.len(),
        path.display(),
        version
    );
    Ok(ArrayFile {
        version,
        dimensions,
        attributes,
        variables,
    })
}

/// Reject variables whose declared shape cannot fit in the file
fn check_extent(
    name: &str,
    dimension_names: &[String],
    nc_type: NcType,
    dimensions: &[Dimension],
    file_len: u64,
) -> Result<()> {
    let mut bytes = nc_type.size() as u64;
    for dimension_name in dimension_names {
        let length = dimensions
            .iter()
            .find(|d| &d.name == dimension_name)
            .map(|d| d.length as u64)
            .ok_or_else(|| {
                Error::array_format(format!(
                    "variable {} uses undefined dimension {}",
                    name, dimension_name
                ))
            })?;
        bytes = bytes.saturating_mul(length);
    }

    if bytes > file_len {
        return Err(Error::array_format(format!(
            "variable {} declares {} bytes but the file holds {}",
            name, bytes, file_len
        )));
    }
    Ok(())
}

/// Every numeric type is widened to `f64`; `NC_CHAR` becomes text
fn array_data(values: DataVector) -> ArrayData {
    let numbers: Vec<f64> = match values {
        DataVector::U8(bytes) => return ArrayData::Text(decode_text(&bytes)),
        DataVector::I8(v) => v.into_iter().map(f64::from).collect(),
        DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
        DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F64(v) => v,
    };
    ArrayData::Numeric(numbers)
}
