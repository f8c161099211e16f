//! Core netCDF writer implementation
//!
//! Maps a [`Dataset`] onto a classic netCDF file through `netcdf3`: one row
//! dimension, one `NC_DOUBLE` variable per dataset variable and the global
//! attributes as `NC_CHAR` text. The file is written to a temporary sibling
//! and persisted atomically, so the destination is either complete or
//! untouched.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use netcdf3::{DataSet, FileWriter, Version};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::format::{Attribute, AttributeValue, NcType, sanitize_name};
use crate::app::models::{Dataset, Variable};
use crate::config::ExportConfig;
use crate::constants::netcdf::{
    BAD_FLAG_ATTR, CNV_NAME_ATTR, CLASSIC_DATA_LIMIT, FILL_VALUE_ATTR, LONG_NAME_ATTR, SPAN_ATTR,
    UNITS_ATTR,
};
use crate::{Error, Result};

/// Summary of one export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStats {
    /// Destination file
    pub path: PathBuf,

    /// Number of array variables written
    pub variables: usize,

    /// Length of the row dimension
    pub rows: usize,

    /// Total file size
    pub bytes_written: u64,

    /// 1 for classic, 2 for 64-bit offset
    pub format_version: u8,
}

/// netCDF classic exporter
#[derive(Debug, Clone, Default)]
pub struct NetcdfWriter {
    config: ExportConfig,
}

impl NetcdfWriter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Write `dataset` to `path`
    pub fn write(&self, dataset: &Dataset, path: &Path) -> Result<ExportStats> {
        self.config.validate()?;
        let destination = path.display().to_string();

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(Error::export(
                &destination,
                format!("directory {} does not exist", parent.display()),
            ));
        }
        if !self.config.overwrite && path.exists() {
            return Err(Error::export(
                &destination,
                "destination exists and overwrite is disabled",
            ));
        }

        let (data_set, names) = self.build_data_set(dataset).map_err(|e| {
            Error::export(&destination, format!("invalid netCDF definition: {}", e))
        })?;
        let version = version_for(dataset);
        let format_version = version_number(&version);
        debug!(
            "Defined {} variables for {} (CDF-{})",
            names.len(),
            destination,
            format_version
        );

        let temp = NamedTempFile::new_in(parent)
            .map_err(|e| Error::export_io(&destination, "failed to create temporary file", e))?;
        let fill_value = self.config.fill_value;
        write_contents(temp.path(), &data_set, version, dataset, &names, fill_value)
            .map_err(|message| Error::export(&destination, message))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::export_io(&destination, "failed to sync temporary file", e))?;

        let persisted = if self.config.overwrite {
            temp.persist(path)
        } else {
            temp.persist_noclobber(path)
        };
        persisted.map_err(|e| {
            Error::export_io(&destination, "failed to move file into place", e.error)
        })?;

        let bytes_written = fs::metadata(path)
            .map_err(|e| Error::export_io(&destination, "failed to stat written file", e))?
            .len();

        info!(
            "Wrote {} variables x {} rows to {}",
            dataset.variables().len(),
            dataset.row_count(),
            destination
        );

        Ok(ExportStats {
            path: path.to_path_buf(),
            variables: dataset.variables().len(),
            rows: dataset.row_count(),
            bytes_written,
            format_version,
        })
    }

    /// Header definition plus the exported name of each dataset variable
    fn build_data_set(
        &self,
        dataset: &Dataset,
    ) -> std::result::Result<(DataSet, Vec<String>), String> {
        let rows = dataset.row_count();
        let dimension = self.config.dimension_name.as_str();
        let mut data_set = DataSet::new();

        // Fixed dimensions cannot be empty, so an empty cast gets a record dimension
        if rows == 0 {
            data_set.set_unlimited_dim(dimension, 0).map_err(describe)?;
        } else {
            data_set.add_fixed_dim(dimension, rows).map_err(describe)?;
        }

        let mut global_names = HashSet::new();
        for (key, value) in dataset.global_attributes() {
            let name = unique_name(key, &mut global_names);
            data_set
                .add_global_attr_string(&name, value)
                .map_err(describe)?;
        }

        let mut variable_names = HashSet::new();
        let mut names = Vec::with_capacity(dataset.variables().len());
        for variable in dataset.variables() {
            let name = unique_name(variable.name(), &mut variable_names);
            data_set.add_var_f64(&name, &[dimension]).map_err(describe)?;
            for attribute in self.variable_attributes(variable, &name) {
                let added = match attribute.value {
                    AttributeValue::Text(text) => {
                        data_set.add_var_attr_string(&name, &attribute.name, text)
                    }
                    AttributeValue::Numbers(numbers) => {
                        data_set.add_var_attr_f64(&name, &attribute.name, numbers)
                    }
                };
                added.map_err(describe)?;
            }
            names.push(name);
        }

        Ok((data_set, names))
    }

    fn variable_attributes(&self, variable: &Variable, name: &str) -> Vec<Attribute> {
        let spec = &variable.spec;
        let mut attributes = vec![Attribute::numbers(
            FILL_VALUE_ATTR,
            vec![self.config.fill_value],
        )];

        if let Some(long_name) = &spec.long_name {
            attributes.push(Attribute::text(LONG_NAME_ATTR, long_name));
        }
        if let Some(unit) = &spec.unit {
            attributes.push(Attribute::text(UNITS_ATTR, unit));
        }
        if let Some(span) = &spec.span {
            attributes.push(Attribute::numbers(SPAN_ATTR, vec![span.min, span.max]));
        }
        if let Some(bad_flag) = spec.bad_flag {
            attributes.push(Attribute::numbers(BAD_FLAG_ATTR, vec![bad_flag]));
        }
        if name != spec.name {
            attributes.push(Attribute::text(CNV_NAME_ATTR, &spec.name));
        }
        attributes
    }
}

/// CDF-2 only once the data no longer fits 32-bit offsets
fn version_for(dataset: &Dataset) -> Version {
    let data_bytes = (dataset.variables().len() as u64)
        .saturating_mul(dataset.row_count() as u64)
        .saturating_mul(NcType::Double.size() as u64);
    if data_bytes < CLASSIC_DATA_LIMIT {
        Version::Classic
    } else {
        Version::Offset64Bit
    }
}

fn version_number(version: &Version) -> u8 {
    match version {
        Version::Classic => 1,
        Version::Offset64Bit => 2,
    }
}

fn describe(error: impl fmt::Debug) -> String {
    format!("{:?}", error)
}

/// Header then one contiguous block of doubles per variable
fn write_contents(
    path: &Path,
    data_set: &DataSet,
    version: Version,
    dataset: &Dataset,
    names: &[String],
    fill_value: f64,
) -> std::result::Result<(), String> {
    let mut writer =
        FileWriter::open(path).map_err(|e| format!("failed to open file: {:?}", e))?;
    writer
        .set_def(data_set, version, 0)
        .map_err(|e| format!("failed to write header: {:?}", e))?;

    // An empty record variable has nothing to write
    if dataset.row_count() > 0 {
        for (variable, name) in dataset.variables().iter().zip(names) {
            let values: Vec<f64> = variable
                .values
                .iter()
                .map(|value| value.unwrap_or(fill_value))
                .collect();
            writer
                .write_var_f64(name, &values)
                .map_err(|e| format!("failed to write variable {}: {:?}", name, e))?;
        }
    }

    writer
        .close()
        .map_err(|e| format!("failed to finish file: {:?}", e))
}

/// Sanitize a name and suffix it until it is unique among `taken`
fn unique_name(raw: &str, taken: &mut HashSet<String>) -> String {
    let base = sanitize_name(raw);
    let mut name = base.clone();
    let mut counter = 1;
    while taken.contains(&name) {
        name = format!("{}_{}", base, counter);
        counter += 1;
    }
    taken.insert(name.clone());
    name
}

/// Export a dataset with default settings
pub fn export(dataset: &Dataset, path: &Path) -> Result<ExportStats> {
    NetcdfWriter::default().write(dataset, path)
}
