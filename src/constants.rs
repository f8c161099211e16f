//! Application constants for the CNV toolchain
//!
//! This module contains the header sigils, attribute names, numeric defaults
//! and netCDF export settings used throughout the crate.

// =============================================================================
// CNV Header Sigils
// =============================================================================

/// End-of-header delimiter line
pub const END_OF_HEADER: &str = "*END*";

/// Prefix of user-typed header lines (`** Ship: ...`)
pub const USER_SIGIL: &str = "**";

/// Prefix of instrument header lines written by the acquisition software
pub const INSTRUMENT_SIGIL: &str = "*";

/// Prefix of lines written by the data processing software
pub const PROCESSING_SIGIL: &str = "#";

/// Width of a single ASCII value field in CNV data lines
pub const CNV_FIELD_WIDTH: usize = 11;

/// File extension of CNV instrument dumps
pub const CNV_EXTENSION: &str = "cnv";

/// File extension of exported netCDF files
pub const NETCDF_EXTENSION: &str = "nc";

// =============================================================================
// Attribute Names
// =============================================================================

/// Global attribute names derived by the parser rather than read from the header
pub mod attributes {
    /// Number of accepted data rows
    pub const ROW_COUNT: &str = "row-count";

    /// Number of data rows skipped by the row decoder
    pub const SKIPPED_ROW_COUNT: &str = "skipped-row-count";

    /// Detected header dialect
    pub const DIALECT: &str = "dialect";

    /// Instrument model reported in the Seasave banner line
    pub const INSTRUMENT_MODEL: &str = "instrument_model";

    /// Free-text instrument header lines, newline joined
    pub const INSTRUMENT_HEADER: &str = "instrument_header";

    /// Free-text comment lines, newline joined
    pub const COMMENTS: &str = "comments";

    /// Prefix for header values whose key clashes with a derived attribute
    pub const HEADER_VALUE_PREFIX: &str = "header_";

    /// Prefix for header lines no sigil rule recognized
    pub const UNKNOWN_LINE_PREFIX: &str = "header_line_";

    /// Decimal-degree position derived from NMEA header lines
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";

    /// ISO 8601 cast start derived from `start_time`
    pub const DATETIME: &str = "datetime";

    /// Header keys the derived attributes are computed from
    pub const NMEA_LATITUDE: &str = "nmea_latitude";
    pub const NMEA_LONGITUDE: &str = "nmea_longitude";
    pub const START_TIME: &str = "start_time";

    /// Declared counts written by the processing software
    pub const NQUAN: &str = "nquan";
    pub const NVALUES: &str = "nvalues";

    /// Data section encoding (`ascii` or `binary`)
    pub const FILE_TYPE: &str = "file_type";

    /// Global bad flag key, used when the declared value is not numeric
    pub const BAD_FLAG: &str = "bad_flag";

    /// Prefix for span declarations that could not be resolved
    pub const UNRESOLVED_SPAN_PREFIX: &str = "span_";

    /// Prefix for per-variable bad flags that could not be resolved
    pub const UNRESOLVED_BAD_FLAG_PREFIX: &str = "bad_flag_";
}

// =============================================================================
// Parser Defaults
// =============================================================================

/// Relative tolerance used when comparing cells against the bad flag
pub const DEFAULT_BAD_FLAG_EPSILON: f64 = 1e-6;

/// `start_time` layout written by Seasoft (`Jun 01 2015 10:12:11`)
pub const START_TIME_FORMAT: &str = "%b %d %Y %H:%M:%S";

/// Output layout for the derived `datetime` attribute
pub const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// netCDF Classic Format
// =============================================================================

/// netCDF naming and sizing constants
pub mod netcdf {
    /// Largest data section written as CDF-1; anything bigger needs 64-bit offsets
    pub const CLASSIC_DATA_LIMIT: u64 = i32::MAX as u64;

    /// Default fill value for NC_DOUBLE
    pub const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

    /// Name of the single row dimension
    pub const DEFAULT_DIMENSION_NAME: &str = "scan";

    /// Attribute names written on exported variables
    pub const FILL_VALUE_ATTR: &str = "_FillValue";
    pub const UNITS_ATTR: &str = "units";
    pub const LONG_NAME_ATTR: &str = "long_name";
    pub const SPAN_ATTR: &str = "span";
    pub const BAD_FLAG_ATTR: &str = "bad_flag";
    pub const CNV_NAME_ATTR: &str = "cnv_name";
}

// =============================================================================
// Environment Overrides
// =============================================================================

/// Environment variable overriding the bad-flag epsilon
pub const ENV_BAD_FLAG_EPSILON: &str = "SEABIRD_BAD_FLAG_EPSILON";

/// Environment variable overriding the number of conversion workers
pub const ENV_WORKERS: &str = "SEABIRD_WORKERS";
