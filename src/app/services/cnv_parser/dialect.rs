//! Header dialect detection
//!
//! Different generations of Sea-Bird acquisition and processing software
//! spell the processing keywords differently. The dialect is detected once
//! from the instrument header and then drives all keyword matching.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Processing keywords the parser routes to dedicated line kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// Variable declaration (`# name 0 = ...`)
    Name,
    /// Declared span (`# span 0 = ...`)
    Span,
    /// Bad-flag sentinel (`# bad_flag = ...`)
    BadFlag,
}

type KeywordTable = &'static [(&'static str, Keyword)];

const SEASAVE_KEYWORDS: KeywordTable = &[
    ("name", Keyword::Name),
    ("span", Keyword::Span),
    ("bad_flag", Keyword::BadFlag),
];

// DOS-era Seasoft also wrote the flag without the underscore
const SEASOFT_DOS_KEYWORDS: KeywordTable = &[
    ("name", Keyword::Name),
    ("span", Keyword::Span),
    ("bad_flag", Keyword::BadFlag),
    ("badflag", Keyword::BadFlag),
];

const GENERIC_KEYWORDS: KeywordTable = &[
    ("name", Keyword::Name),
    ("span", Keyword::Span),
    ("bad_flag", Keyword::BadFlag),
    ("badflag", Keyword::BadFlag),
    ("bad-flag", Keyword::BadFlag),
];

static SEASAVE_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*\s*Sea-Bird\s+(SBE\s*[0-9A-Za-z+]+)\s+Data File\s*:")
        .expect("static regex is valid")
});

static SEASOFT_DOS_BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*\s*(SEASOFT|SEACAT)").expect("static regex is valid"));

/// Known header dialects plus a permissive fallback
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    /// Windows Seasave / SBE Data Processing (`* Sea-Bird SBE 9 Data File:`)
    Seasave { model: String },
    /// DOS-era Seasoft and SEACAT profiler uploads
    SeasoftDos,
    /// Anything else; accepts every known keyword spelling
    Generic,
}

impl Dialect {
    /// Pick a dialect from the instrument header lines, first match wins
    pub fn detect<'a>(instrument_lines: impl IntoIterator<Item = &'a str>) -> Self {
        for line in instrument_lines {
            let line = line.trim();
            if let Some(captures) = SEASAVE_BANNER.captures(line) {
                let model = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
                return Dialect::Seasave { model };
            }
            if SEASOFT_DOS_BANNER.is_match(line) {
                return Dialect::SeasoftDos;
            }
        }
        Dialect::Generic
    }

    /// Keyword spellings this dialect recognizes
    pub fn keywords(&self) -> &'static [(&'static str, Keyword)] {
        match self {
            Dialect::Seasave { .. } => SEASAVE_KEYWORDS,
            Dialect::SeasoftDos => SEASOFT_DOS_KEYWORDS,
            Dialect::Generic => GENERIC_KEYWORDS,
        }
    }

    /// Map a keyword token through the synonym table
    pub fn keyword(&self, token: &str) -> Option<Keyword> {
        lookup_keyword(self.keywords(), token)
    }

    /// Stable name recorded in the `dialect` attribute
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Seasave { .. } => "seasave",
            Dialect::SeasoftDos => "seasoft-dos",
            Dialect::Generic => "generic",
        }
    }

    /// Instrument model, when the banner reported one
    pub fn model(&self) -> Option<&str> {
        match self {
            Dialect::Seasave { model } => Some(model),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model() {
            Some(model) => write!(f, "{} ({})", self.name(), model),
            None => f.write_str(self.name()),
        }
    }
}

pub(crate) fn lookup_keyword(table: &[(&str, Keyword)], token: &str) -> Option<Keyword> {
    table
        .iter()
        .find(|(spelling, _)| spelling.eq_ignore_ascii_case(token))
        .map(|(_, keyword)| *keyword)
}
