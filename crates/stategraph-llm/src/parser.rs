//! Enum-label output parsing
//!
//! Maps raw completion text onto a fixed set of labels. Matching is
//! case-insensitive and ignores surrounding whitespace, so `" YES \n"`
//! parses as `YES`. Unknown text fails with [`ParseError`]; whether that
//! aborts a run or degrades to a conservative default is the caller's
//! choice, not the parser's.

use thiserror::Error;

/// The completion text did not map to any known label
#[derive(Debug, Clone, Error)]
#[error("could not parse '{text}' into one of {labels:?}")]
pub struct ParseError {
    /// The raw text that failed to parse
    pub text: String,
    /// The labels that were expected
    pub labels: Vec<String>,
}

/// Parser over a fixed, enumerated set of labels
#[derive(Debug, Clone)]
pub struct EnumOutputParser {
    labels: Vec<String>,
}

impl EnumOutputParser {
    /// Build a parser accepting exactly these labels
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted labels, in declaration order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Map raw text onto its canonical label
    pub fn parse(&self, text: &str) -> Result<String, ParseError> {
        let needle = text.trim();
        self.labels
            .iter()
            .find(|label| label.eq_ignore_ascii_case(needle))
            .cloned()
            .ok_or_else(|| ParseError {
                text: text.to_string(),
                labels: self.labels.clone(),
            })
    }
}
