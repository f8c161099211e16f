//! Header tokenizer
//!
//! Locates the `*END*` delimiter and classifies every line of a CNV file by
//! its leading sigil. The line sequence is lazy and can be restarted by
//! cloning the iterator or asking the tokenizer for a fresh one.

use std::iter::Enumerate;
use std::str::Lines;

use super::dialect::{Dialect, Keyword, lookup_keyword};
use super::field_parsers::leading_keyword;
use crate::app::models::{LineKind, RawLine};
use crate::constants::{END_OF_HEADER, INSTRUMENT_SIGIL, PROCESSING_SIGIL, USER_SIGIL};
use crate::{Error, Result};

/// Tokenizer over the full text of one CNV file
#[derive(Debug, Clone, Copy)]
pub struct HeaderTokenizer<'a> {
    text: &'a str,
    /// Line number of the `*END*` delimiter
    header_end: usize,
}

impl<'a> HeaderTokenizer<'a> {
    /// Locate the end-of-header delimiter; fails when there is none
    pub fn new(text: &'a str) -> Result<Self> {
        let header_end = text
            .lines()
            .position(|line| line.trim() == END_OF_HEADER)
            .ok_or_else(|| {
                Error::malformed_header(format!(
                    "no '{}' end-of-header delimiter found",
                    END_OF_HEADER
                ))
            })?;

        Ok(Self { text, header_end })
    }

    /// Number of lines before the delimiter
    pub fn header_line_count(&self) -> usize {
        self.header_end
    }

    /// Raw text of the instrument header lines, for dialect detection
    pub fn instrument_lines(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.text
            .lines()
            .take(self.header_end)
            .filter(|line| classify_sigil(line) == Some(LineKind::InstrumentInfo))
    }

    /// Every line of the file, classified with the dialect's keyword table
    pub fn lines(&self, dialect: &Dialect) -> RawLines<'a> {
        RawLines {
            lines: self.text.lines().enumerate(),
            header_end: self.header_end,
            keywords: dialect.keywords(),
        }
    }

    /// Header lines followed by the delimiter
    pub fn header_lines(
        &self,
        dialect: &Dialect,
    ) -> impl Iterator<Item = RawLine<'a>> + Clone + use<'a> {
        self.lines(dialect)
            .take_while(|line| line.kind != LineKind::Data)
    }

    /// Lines after the delimiter
    pub fn data_lines(
        &self,
        dialect: &Dialect,
    ) -> impl Iterator<Item = RawLine<'a>> + Clone + use<'a> {
        self.lines(dialect)
            .skip_while(|line| line.kind != LineKind::Sentinel)
            .skip(1)
    }
}

/// Lazy, restartable sequence of classified lines
#[derive(Debug, Clone)]
pub struct RawLines<'a> {
    lines: Enumerate<Lines<'a>>,
    header_end: usize,
    keywords: &'static [(&'static str, Keyword)],
}

impl<'a> Iterator for RawLines<'a> {
    type Item = RawLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (number, text) = self.lines.next()?;

            let kind = if number > self.header_end {
                LineKind::Data
            } else if number == self.header_end {
                LineKind::Sentinel
            } else if text.trim().is_empty() {
                continue;
            } else {
                classify_header_line(text, self.keywords)
            };

            return Some(RawLine { number, text, kind });
        }
    }
}

/// Classify a header line by sigil only; `#` lines report `UserComment`
fn classify_sigil(text: &str) -> Option<LineKind> {
    let trimmed = text.trim_start();
    if trimmed.trim_end() == END_OF_HEADER {
        Some(LineKind::Sentinel)
    } else if trimmed.starts_with(USER_SIGIL) {
        Some(LineKind::UserComment)
    } else if trimmed.starts_with(INSTRUMENT_SIGIL) {
        Some(LineKind::InstrumentInfo)
    } else if trimmed.starts_with(PROCESSING_SIGIL) {
        Some(LineKind::UserComment)
    } else {
        None
    }
}

/// Full classification of a header line, including `#` keyword routing
pub fn classify_header_line(text: &str, keywords: &[(&str, Keyword)]) -> LineKind {
    let trimmed = text.trim_start();

    if let Some(body) = trimmed.strip_prefix(PROCESSING_SIGIL) {
        return match lookup_keyword(keywords, leading_keyword(body)) {
            Some(Keyword::Name) => LineKind::VariableDecl,
            Some(Keyword::Span) => LineKind::SpanDecl,
            Some(Keyword::BadFlag) => LineKind::BadFlagDecl,
            None => LineKind::UserComment,
        };
    }

    classify_sigil(text).unwrap_or(LineKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_header_sigils() {
        let keywords = Dialect::Generic.keywords();
        let cases = [
            ("* Sea-Bird SBE 9 Data File:", LineKind::InstrumentInfo),
            ("*Temperature SN = 5621", LineKind::InstrumentInfo),
            ("** Ship: Antares", LineKind::UserComment),
            ("# nquan = 3", LineKind::UserComment),
            ("# name 0 = prDM: Pressure [db]", LineKind::VariableDecl),
            ("# span 0 = 1, 2", LineKind::SpanDecl),
            ("# bad_flag = -9.990e-29", LineKind::BadFlagDecl),
            ("# names are listed below", LineKind::UserComment),
            ("*END*", LineKind::Sentinel),
            ("cruise notes", LineKind::Unknown),
        ];

        for (text, expected) in cases {
            assert_eq!(classify_header_line(text, keywords), expected, "{}", text);
        }
    }

    #[test]
    fn test_missing_delimiter_is_malformed_header() {
        let result = HeaderTokenizer::new("* Sea-Bird SBE 9 Data File:\n# nquan = 1\n 1.0\n");
        assert!(matches!(result, Err(Error::MalformedHeader { .. })));
    }

    #[test]
    fn test_lines_are_restartable() {
        let text = "* a = 1\n\n# name 0 = x\n*END*\n 1.0\n 2.0\n";
        let tokenizer = HeaderTokenizer::new(text).unwrap();
        let lines = tokenizer.lines(&Dialect::Generic);

        let first: Vec<_> = lines.clone().collect();
        let second: Vec<_> = lines.collect();
        assert_eq!(first, second);

        // blank header line is dropped, numbering is preserved
        let kinds: Vec<_> = first.iter().map(|l| (l.number, l.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, LineKind::InstrumentInfo),
                (2, LineKind::VariableDecl),
                (3, LineKind::Sentinel),
                (4, LineKind::Data),
                (5, LineKind::Data),
            ]
        );
    }
}
