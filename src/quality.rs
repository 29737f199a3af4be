use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use itertools::Itertools;

use crate::metrics::QualityMetricRecord;
use crate::model::{ParsingMethod, ValidatedRecord};

/// `round(100 * valid / parsed)`, and 0 when nothing was parsed.
pub fn score_counts(parsed: usize, valid: usize) -> u8 {
    if parsed == 0 {
        return 0;
    }
    let valid = valid.min(parsed);
    ((valid as f64 * 100.0) / parsed as f64).round() as u8
}

/// Batch score over every record that survived structural extraction.
pub fn score(records: &[ValidatedRecord]) -> u8 {
    let valid = records.iter().filter(|r| r.is_valid).count();
    score_counts(records.len(), valid)
}

/// Error message → number of records carrying that code.
pub fn common_errors(records: &[ValidatedRecord]) -> BTreeMap<String, usize> {
    records
        .iter()
        .flat_map(|r| r.validation_errors.iter().unique())
        .map(|code| code.to_string())
        .counts()
        .into_iter()
        .collect()
}

pub struct MetricInput<'a> {
    pub session_id: &'a str,
    pub site: &'a str,
    pub parsing_method: ParsingMethod,
    pub records: &'a [ValidatedRecord],
    pub elapsed: Duration,
}

pub fn build_metric(input: MetricInput<'_>) -> QualityMetricRecord {
    let parsed = input.records.len();
    let valid = input.records.iter().filter(|r| r.is_valid).count();
    let average_processing_time_ms = if parsed == 0 {
        0.0
    } else {
        input.elapsed.as_secs_f64() * 1000.0 / parsed as f64
    };

    QualityMetricRecord {
        session_id: input.session_id.to_string(),
        timestamp: Utc::now(),
        site: input.site.to_string(),
        total_parsed: parsed,
        valid_jobs: valid,
        invalid_jobs: parsed - valid,
        quality_score: score_counts(parsed, valid),
        common_errors: common_errors(input.records),
        parsing_method: input.parsing_method,
        average_processing_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateRecord, ErrorCode, SourceSite};

    fn validated(is_valid: bool, errors: Vec<ErrorCode>) -> ValidatedRecord {
        ValidatedRecord {
            record: CandidateRecord::new(SourceSite::Generic),
            is_valid,
            validation_errors: errors,
            quality_contribution: 0,
            suspicious_reasons: Vec::new(),
        }
    }

    #[test]
    fn zero_parsed_scores_zero() {
        assert_eq!(score_counts(0, 0), 0);
        assert_eq!(score(&[]), 0);
    }

    #[test]
    fn ratio_rounded() {
        assert_eq!(score_counts(4, 3), 75);
        assert_eq!(score_counts(3, 1), 33);
        assert_eq!(score_counts(3, 2), 67);
        assert_eq!(score_counts(5, 5), 100);
    }

    #[test]
    fn bounded_even_with_bad_counts() {
        assert_eq!(score_counts(2, 9), 100);
    }

    #[test]
    fn errors_counted_once_per_record() {
        let records = vec![
            validated(true, vec![ErrorCode::MissingPay]),
            validated(true, vec![ErrorCode::MissingPay, ErrorCode::MissingLocation]),
            validated(false, vec![ErrorCode::SuspiciousContent, ErrorCode::SuspiciousContent]),
        ];
        let errs = common_errors(&records);
        assert_eq!(errs.get("missing pay"), Some(&2));
        assert_eq!(errs.get("missing location"), Some(&1));
        assert_eq!(errs.get("suspicious content"), Some(&1));
    }

    #[test]
    fn metric_from_records() {
        let records = vec![
            validated(true, vec![]),
            validated(true, vec![]),
            validated(true, vec![]),
            validated(false, vec![ErrorCode::SuspiciousContent]),
        ];
        let m = build_metric(MetricInput {
            session_id: "s1",
            site: "indeed",
            parsing_method: ParsingMethod::Dom,
            records: &records,
            elapsed: Duration::from_millis(8),
        });
        assert_eq!(m.total_parsed, 4);
        assert_eq!(m.valid_jobs, 3);
        assert_eq!(m.invalid_jobs, 1);
        assert_eq!(m.quality_score, 75);
        assert!((m.average_processing_time_ms - 2.0).abs() < 1e-9);
    }
}
