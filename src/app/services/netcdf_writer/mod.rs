//! netCDF classic exporter for parsed CNV datasets
//!
//! This module writes a [`Dataset`](crate::app::models::Dataset) to a
//! self-describing netCDF classic file and reads such files back. Encoding is
//! delegated to the pure Rust `netcdf3` crate, so no native netCDF library
//! is needed.
//!
//! # Architecture
//!
//! - [`format`] - Owned header model and name sanitization
//! - [`writer`] - Dataset to file mapping and atomic persistence
//! - [`reader`] - CDF-1/CDF-2 reading for verification and `dump`
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use seabird_cnv::app::services::netcdf_writer::NetcdfWriter;
//! use seabird_cnv::config::ExportConfig;
//!
//! # fn example() -> seabird_cnv::Result<()> {
//! let dataset = seabird_cnv::parse_file(Path::new("cast.cnv"))?;
//! let writer = NetcdfWriter::new(ExportConfig::default().with_overwrite(false));
//! let stats = writer.write(&dataset, Path::new("cast.nc"))?;
//!
//! println!("Wrote {} variables, {} bytes", stats.variables, stats.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod format;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use format::{Attribute, AttributeValue, Dimension, NcType, sanitize_name};
pub use reader::{ArrayData, ArrayFile, ArrayVariable, read_netcdf};
pub use writer::{ExportStats, NetcdfWriter, export};
