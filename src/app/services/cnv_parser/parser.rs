//! Core CNV parser implementation
//!
//! This module drives the pipeline: tokenize the header, detect the dialect,
//! extract metadata, decode rows and assemble the dataset. Each stage is
//! tracked so a rejected file reports where it failed.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::assembler::assemble;
use super::dialect::Dialect;
use super::metadata::MetadataExtractor;
use super::row_decoder::RowDecoder;
use super::tokenizer::HeaderTokenizer;
use crate::app::models::Dataset;
use crate::config::ParserConfig;
use crate::{Error, Result};

/// Pipeline stage, reported when a file is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Start,
    TokenizingHeader,
    ExtractingMetadata,
    DecodingRows,
    Assembled,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStage::Start => "start",
            ParseStage::TokenizingHeader => "tokenizing header",
            ParseStage::ExtractingMetadata => "extracting metadata",
            ParseStage::DecodingRows => "decoding rows",
            ParseStage::Assembled => "assembled",
        };
        f.write_str(name)
    }
}

/// CNV parser with configurable tolerances
///
/// Parsing is deterministic: the same bytes and configuration always produce
/// an equal [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct CnvParser {
    config: ParserConfig,
}

impl CnvParser {
    /// Create a parser with the given settings
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the full text of a CNV file
    pub fn parse_str(&self, text: &str) -> Result<Dataset> {
        let mut stage = ParseStage::Start;
        let result = self.run(text, &mut stage);
        if let Err(e) = &result {
            warn!("CNV input rejected while {}: {}", stage, e);
        }
        result
    }

    /// Read everything from `reader` and parse it
    ///
    /// Invalid UTF-8 (legacy DOS code pages in operator comments) is replaced
    /// rather than rejected.
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Dataset> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Error::io("Failed to read CNV input", e))?;
        let text = String::from_utf8_lossy(&bytes);
        self.parse_str(&text)
    }

    /// Open and parse a CNV file
    pub fn parse_file(&self, path: &Path) -> Result<Dataset> {
        info!("Parsing CNV file: {}", path.display());

        let file = File::open(path)
            .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
        let dataset = self.parse_reader(file)?;

        info!(
            "Parsed {} variables and {} rows from {}",
            dataset.variables().len(),
            dataset.row_count(),
            path.display()
        );
        Ok(dataset)
    }

    fn run(&self, text: &str, stage: &mut ParseStage) -> Result<Dataset> {
        self.config.validate()?;

        *stage = ParseStage::TokenizingHeader;
        let tokenizer = HeaderTokenizer::new(text)?;
        let dialect = Dialect::detect(tokenizer.instrument_lines());
        debug!(
            "Header has {} lines, dialect {}",
            tokenizer.header_line_count(),
            dialect
        );

        *stage = ParseStage::ExtractingMetadata;
        let metadata =
            MetadataExtractor::extract(dialect.clone(), tokenizer.header_lines(&dialect))?;

        *stage = ParseStage::DecodingRows;
        let decoder = RowDecoder::new(metadata.sentinels(), &self.config);
        let decoded = decoder.decode(tokenizer.data_lines(&dialect));

        let dataset = assemble(metadata, decoded, tokenizer.header_line_count())?;
        *stage = ParseStage::Assembled;
        Ok(dataset)
    }
}

/// Parse CNV input from any reader with default settings
pub fn parse<R: Read>(reader: R) -> Result<Dataset> {
    CnvParser::default().parse_reader(reader)
}

/// Parse CNV text with default settings
pub fn parse_str(text: &str) -> Result<Dataset> {
    CnvParser::default().parse_str(text)
}

/// Parse a CNV file with default settings
pub fn parse_file(path: &Path) -> Result<Dataset> {
    CnvParser::default().parse_file(path)
}
