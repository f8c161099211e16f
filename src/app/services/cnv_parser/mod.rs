//! CNV parser for Sea-Bird CTD instrument dumps
//!
//! This module turns the text of a `.cnv` file into an immutable
//! [`Dataset`](crate::app::models::Dataset). Header dialects written by
//! different generations of Seasoft are detected and normalized so that
//! attributes query the same way regardless of origin.
//!
//! ## Architecture
//!
//! The parser is organized into pipeline stages:
//! - [`tokenizer`] - End-of-header detection and line classification
//! - [`dialect`] - Dialect detection and keyword synonym tables
//! - [`metadata`] - Global attributes, variable declarations and bad flags
//! - [`row_decoder`] - Data row splitting, sentinel masking and error recovery
//! - [`assembler`] - Dataset assembly and span sanity checks
//! - [`parser`] - Orchestration and file handling
//! - [`field_parsers`] - Utility functions for header field parsing
//! - [`stats`] - Parsing statistics
//!
//! ## Usage
//!
//! ```rust,no_run
//! use seabird_cnv::app::services::cnv_parser::CnvParser;
//! use seabird_cnv::config::ParserConfig;
//!
//! # fn example() -> seabird_cnv::Result<()> {
//! let parser = CnvParser::new(ParserConfig::default().with_bad_flag_epsilon(1e-9));
//! let dataset = parser.parse_file(std::path::Path::new("cast.cnv"))?;
//!
//! println!("Parsed {} rows, skipped {}",
//!          dataset.row_count(),
//!          dataset.skipped_rows());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod dialect;
pub mod field_parsers;
pub mod metadata;
pub mod parser;
pub mod row_decoder;
pub mod stats;
pub mod tokenizer;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use dialect::{Dialect, Keyword};
pub use metadata::{HeaderMetadata, MetadataExtractor};
pub use parser::{CnvParser, ParseStage, parse, parse_file, parse_str};
pub use row_decoder::{DecodedRows, RowDecoder, RowIssue};
pub use stats::ParseStats;
pub use tokenizer::HeaderTokenizer;
