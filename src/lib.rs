//! Sea-Bird CNV Library
//!
//! A Rust library for reading Sea-Bird CTD `.cnv` instrument dumps into a
//! validated, self-describing in-memory dataset and writing that dataset to
//! netCDF classic files.
//!
//! This library provides tools for:
//! - Tokenizing CNV files into classified header lines and data lines
//! - Detecting the header dialect written by different Seasoft generations
//! - Recovering instrument identity, variable declarations, spans and bad flags
//! - Decoding data rows with bad-flag masking and per-row error recovery
//! - Exporting datasets to netCDF classic files with atomic replacement
//!
//! ```rust
//! let text = "\
//! * Sea-Bird SBE 9 Data File:
//! ## name 0 = prDM: Pressure, Digiquartz [db]
//! ## bad_flag = -9.990e-29
//! *END*
//!       1.000
//! -9.990e-29
//! ";
//! let dataset = seabird_cnv::parse_str(text)?;
//! let pressure = dataset.variable("prDM").unwrap();
//! assert_eq!(pressure.values, vec![Some(1.0), None]);
//! # Ok::<(), seabird_cnv::Error>(())
//! ```

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod cnv_parser;
        pub mod netcdf_writer;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
    pub mod input;
}

// Re-export commonly used types
pub use app::models::{Dataset, Variable, VariableSpec};
pub use app::services::cnv_parser::{CnvParser, Dialect, parse, parse_file, parse_str};
pub use app::services::netcdf_writer::{NetcdfWriter, export, read_netcdf};
pub use config::Config;

/// Result type alias for CNV processing
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for CNV parsing and netCDF export
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// No end-of-header delimiter, so the data section cannot be located
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    /// A `# name` declaration that cannot produce a variable
    #[error("Malformed variable declaration on line {line}: {reason}")]
    MalformedVariableDecl { line: usize, reason: String },

    /// Data section encoding the parser does not decode
    #[error("Unsupported CNV file type: {file_type}")]
    UnsupportedFileType { file_type: String },

    /// Internal consistency failure while building the dataset
    #[error("Dataset assembly failed: {message}")]
    Assembly { message: String },

    /// netCDF export failed
    #[error("Export to '{path}' failed: {message}")]
    Export {
        path: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// netCDF file could not be decoded
    #[error("netCDF format error: {message}")]
    ArrayFormat { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a malformed header error
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// Create a malformed variable declaration error
    pub fn malformed_variable_decl(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedVariableDecl {
            line,
            reason: reason.into(),
        }
    }

    /// Create an unsupported file type error
    pub fn unsupported_file_type(file_type: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            file_type: file_type.into(),
        }
    }

    /// Create an assembly error
    pub fn assembly(message: impl Into<String>) -> Self {
        Self::Assembly {
            message: message.into(),
        }
    }

    /// Create an export error without an underlying I/O cause
    pub fn export(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an export error caused by an I/O failure
    pub fn export_io(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a netCDF decoding error
    pub fn array_format(message: impl Into<String>) -> Self {
        Self::ArrayFormat {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for the fatal parse kinds a user can act on (bad input file)
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedHeader { .. }
                | Error::MalformedVariableDecl { .. }
                | Error::UnsupportedFileType { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
