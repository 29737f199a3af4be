use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::classify::classify;
use crate::config::Settings;
use crate::dedupe::dedupe;
use crate::metrics::MetricsStore;
use crate::model::{BatchResult, ValidatedRecord};
use crate::parser;
use crate::quality::{self, MetricInput};
use crate::sanitize::sanitize_with_report;
use crate::validate::Validator;

pub const NO_LISTINGS_ERROR: &str = "no listings could be extracted from input";

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// One call from the search orchestration: raw input plus the site it came from.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub html: String,
    pub markdown: String,
    pub site_id: String,
    /// Caller's session id; generated when absent.
    pub session_id: Option<String>,
}

impl ExtractionRequest {
    pub fn html(site_id: &str, html: impl Into<String>) -> Self {
        ExtractionRequest {
            html: html.into(),
            site_id: site_id.to_string(),
            ..Default::default()
        }
    }

    pub fn markdown(site_id: &str, markdown: impl Into<String>) -> Self {
        ExtractionRequest {
            markdown: markdown.into(),
            site_id: site_id.to_string(),
            ..Default::default()
        }
    }
}

/// Extraction, validation and scoring for one batch at a time. Cheap to
/// clone; clones share the metrics store.
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    validator: Validator,
    metrics: MetricsStore,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_settings(Settings::default())
    }
}

impl Pipeline {
    pub fn new(settings: Settings, metrics: MetricsStore) -> Self {
        let validator = Validator::new(settings.weights.clone(), settings.min_description_chars);
        Pipeline {
            settings,
            validator,
            metrics,
        }
    }

    pub fn from_settings(settings: Settings) -> Self {
        let metrics = MetricsStore::new(settings.metrics_capacity);
        Self::new(settings, metrics)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    #[instrument(skip_all, fields(site = %request.site_id))]
    pub fn run(&self, request: &ExtractionRequest) -> BatchResult {
        let started = Instant::now();
        let session_id = request.session_id.clone().unwrap_or_else(next_session_id);

        let (parsing_method, candidates) = parser::extract_with(
            &request.html,
            &request.markdown,
            &request.site_id,
            self.settings.input_precedence,
            self.settings.fallback_to_other_input,
        );
        debug!(method = %parsing_method, candidates = candidates.len(), "extracted");

        let validated: Vec<ValidatedRecord> = candidates
            .iter()
            .map(|candidate| {
                let (clean, report) =
                    sanitize_with_report(candidate, self.settings.description_max_chars);
                let classification = classify(&clean);
                self.validator.validate(clean, &classification, report)
            })
            .collect();

        let parsed = validated.len();
        let valid = validated.iter().filter(|r| r.is_valid).count();
        let invalid = parsed - valid;
        let quality_score = quality::score_counts(parsed, valid);

        let mut errors: Vec<String> = validated
            .iter()
            .filter(|r| !r.is_valid)
            .map(rejection_message)
            .collect();
        if parsed == 0 {
            errors.push(NO_LISTINGS_ERROR.to_string());
        }

        self.metrics.record(quality::build_metric(MetricInput {
            session_id: &session_id,
            site: &request.site_id,
            parsing_method,
            records: &validated,
            elapsed: started.elapsed(),
        }));

        let records = dedupe(validated);
        let duplicates = valid - records.len();

        info!(
            session = %session_id,
            method = %parsing_method,
            parsed,
            valid,
            invalid,
            duplicates,
            quality_score,
            "batch scored"
        );

        BatchResult {
            session_id,
            site: request.site_id.clone(),
            parsing_method,
            records,
            parsed,
            valid,
            invalid,
            duplicates,
            quality_score,
            errors,
        }
    }
}

fn rejection_message(record: &ValidatedRecord) -> String {
    let title = match record.record.title.as_str() {
        "" => "(untitled)",
        t => t,
    };
    let codes = record
        .validation_errors
        .iter()
        .filter(|c| c.is_hard())
        .join(", ");
    if record.suspicious_reasons.is_empty() {
        format!("rejected \"{title}\": {codes}")
    } else {
        format!(
            "rejected \"{title}\": {codes} ({})",
            record.suspicious_reasons.join("; ")
        )
    }
}

fn next_session_id() -> String {
    let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("session-{}-{seq}", Utc::now().timestamp_millis())
}
