use crate::classify::Classification;
use crate::config::SoftWeights;
use crate::model::{CandidateRecord, ErrorCode, ValidatedRecord};
use crate::sanitize::SanitizeReport;

pub const DEFAULT_MIN_DESCRIPTION_CHARS: usize = 20;

/// Field rules applied to one sanitized, classified record.
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    pub weights: SoftWeights,
    pub min_description_chars: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Validator {
            weights: SoftWeights::default(),
            min_description_chars: DEFAULT_MIN_DESCRIPTION_CHARS,
        }
    }
}

impl Validator {
    pub fn new(weights: SoftWeights, min_description_chars: usize) -> Self {
        Validator {
            weights,
            min_description_chars,
        }
    }

    pub fn validate(
        &self,
        record: CandidateRecord,
        classification: &Classification,
        report: SanitizeReport,
    ) -> ValidatedRecord {
        let mut errors = Vec::new();

        if record.title.trim().is_empty() {
            errors.push(ErrorCode::MissingTitle);
        }
        if record.company.trim().is_empty() {
            errors.push(ErrorCode::MissingCompany);
        }
        if classification.suspicious {
            errors.push(ErrorCode::SuspiciousContent);
        }

        if record.description.trim().chars().count() < self.min_description_chars {
            errors.push(ErrorCode::ShortDescription);
        }
        if record.location.trim().is_empty() {
            errors.push(ErrorCode::MissingLocation);
        }
        if record.pay.as_deref().map_or(true, |p| p.trim().is_empty()) {
            errors.push(ErrorCode::MissingPay);
        }
        if report.description_truncated {
            errors.push(ErrorCode::TruncatedDescription);
        }

        let is_valid = !errors.iter().any(|e| e.is_hard());
        let quality_contribution = if is_valid {
            errors
                .iter()
                .fold(100u8, |score, &code| score.saturating_sub(self.weight(code)))
        } else {
            0
        };

        ValidatedRecord {
            record,
            is_valid,
            validation_errors: errors,
            quality_contribution,
            suspicious_reasons: classification.reasons.clone(),
        }
    }

    fn weight(&self, code: ErrorCode) -> u8 {
        match code {
            ErrorCode::ShortDescription => self.weights.short_description,
            ErrorCode::MissingLocation => self.weights.missing_location,
            ErrorCode::MissingPay => self.weights.missing_pay,
            ErrorCode::TruncatedDescription => self.weights.truncated_description,
            ErrorCode::MissingTitle | ErrorCode::MissingCompany | ErrorCode::SuspiciousContent => 0,
        }
    }
}

/// Validate with the documented default weights.
pub fn validate(record: CandidateRecord, classification: &Classification) -> ValidatedRecord {
    Validator::default().validate(record, classification, SanitizeReport::default())
}
