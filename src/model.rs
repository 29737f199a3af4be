use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Which site policy a record was sliced with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceSite {
    Known(&'static str),
    Generic,
}

impl SourceSite {
    pub fn as_str(&self) -> &str {
        match self {
            SourceSite::Known(id) => id,
            SourceSite::Generic => "generic",
        }
    }
}

impl fmt::Display for SourceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceSite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A structurally extracted, not yet validated listing guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub pay: Option<String>,
    pub schedule: Option<String>,
    pub description: String,
    pub url: Option<String>,
    pub source_site: SourceSite,
}

impl CandidateRecord {
    pub fn new(source_site: SourceSite) -> Self {
        CandidateRecord {
            title: String::new(),
            company: String::new(),
            location: String::new(),
            pay: None,
            schedule: None,
            description: String::new(),
            url: None,
            source_site,
        }
    }
}

/// Per-record validation finding. Hard codes invalidate the record, soft
/// codes only lower its quality contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    #[error("missing title")]
    MissingTitle,
    #[error("missing company")]
    MissingCompany,
    #[error("suspicious content")]
    SuspiciousContent,
    #[error("description too short")]
    ShortDescription,
    #[error("missing location")]
    MissingLocation,
    #[error("missing pay")]
    MissingPay,
    #[error("description truncated")]
    TruncatedDescription,
}

impl ErrorCode {
    pub fn is_hard(self) -> bool {
        matches!(
            self,
            ErrorCode::MissingTitle | ErrorCode::MissingCompany | ErrorCode::SuspiciousContent
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    #[serde(flatten)]
    pub record: CandidateRecord,
    pub is_valid: bool,
    pub validation_errors: Vec<ErrorCode>,
    pub quality_contribution: u8,
    /// Classifier reasons, kept for debugging even when the record is rejected.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suspicious_reasons: Vec<String>,
}

/// Extraction strategy chosen for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMethod {
    Dom,
    Markdown,
}

impl fmt::Display for ParsingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsingMethod::Dom => f.write_str("dom"),
            ParsingMethod::Markdown => f.write_str("markdown"),
        }
    }
}

/// Outcome of one pipeline invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub session_id: String,
    pub site: String,
    pub parsing_method: ParsingMethod,
    /// Valid, deduplicated records in extraction order.
    pub records: Vec<ValidatedRecord>,
    pub parsed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub quality_score: u8,
    pub errors: Vec<String>,
}
