use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::CandidateRecord;

static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());

/// Phrases that show up in search-page chrome rather than in real listings.
/// Matched as case-insensitive substrings of the title and company, so a
/// phrase hidden inside longer words still counts.
pub const NOISE_PHRASES: &[&str] = &[
    "saved search",
    "save this search",
    "sign in",
    "log in to",
    "refine your search",
    "no results",
    "no jobs found",
    "no matching jobs",
    "create job alert",
    "create a job alert",
    "get job alerts",
    "job alerts",
    "loading more results",
    "load more",
    "search suggestions",
    "did you mean",
    "show more jobs",
    "page 1 of",
    "next page",
    "previous page",
    "sort by",
    "upload your resume",
];

pub const MIN_TITLE_CHARS: usize = 3;
pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub suspicious: bool,
    pub reasons: Vec<String>,
}

/// Decide whether a sanitized record reads like a listing or like page UI.
/// Never discards anything; reasons are kept for metrics and debugging.
pub fn classify(record: &CandidateRecord) -> Classification {
    let mut reasons = Vec::new();

    for (field, value) in [("title", &record.title), ("company", &record.company)] {
        let lower = value.to_lowercase();
        for phrase in NOISE_PHRASES {
            if lower.contains(phrase) {
                reasons.push(format!("{field} contains noise phrase \"{phrase}\""));
            }
        }
    }

    if BARE_URL_RE.is_match(&record.title) {
        reasons.push("title contains a bare URL".to_string());
    }

    let title_len = record.title.trim().chars().count();
    if title_len < MIN_TITLE_CHARS {
        reasons.push(format!("title shorter than {MIN_TITLE_CHARS} characters"));
    } else if title_len > MAX_TITLE_CHARS {
        reasons.push(format!("title longer than {MAX_TITLE_CHARS} characters"));
    }

    if record.company.trim().is_empty() {
        reasons.push("company is blank".to_string());
    }

    Classification {
        suspicious: !reasons.is_empty(),
        reasons,
    }
}
