use std::collections::HashSet;

use crate::model::ValidatedRecord;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Keep the first valid record per normalized (title, company) pair.
/// Invalid records are dropped from the output; they have already been
/// counted by the caller.
pub fn dedupe(records: Vec<ValidatedRecord>) -> Vec<ValidatedRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.is_valid)
        .filter(|r| seen.insert((normalize(&r.record.title), normalize(&r.record.company))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateRecord, SourceSite};

    fn validated(title: &str, company: &str, is_valid: bool) -> ValidatedRecord {
        ValidatedRecord {
            record: CandidateRecord {
                title: title.into(),
                company: company.into(),
                ..CandidateRecord::new(SourceSite::Generic)
            },
            is_valid,
            validation_errors: Vec::new(),
            quality_contribution: if is_valid { 100 } else { 0 },
            suspicious_reasons: Vec::new(),
        }
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        let out = dedupe(vec![
            validated("Data Analyst", "Acme Corp", true),
            validated("data analyst ", "ACME CORP", true),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.title, "Data Analyst");
    }

    #[test]
    fn different_company_kept() {
        let out = dedupe(vec![
            validated("Data Analyst", "Acme Corp", true),
            validated("Data Analyst", "Globex", true),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn invalid_records_excluded_and_do_not_shadow() {
        let out = dedupe(vec![
            validated("Data Analyst", "Acme Corp", false),
            validated("Data Analyst", "Acme Corp", true),
        ]);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_valid);
    }

    #[test]
    fn order_preserved() {
        let out = dedupe(vec![
            validated("B", "x", true),
            validated("A", "x", true),
            validated("b", "X", true),
        ]);
        let titles: Vec<&str> = out.iter().map(|r| r.record.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
    }
}
