//! Rolling store of per-batch quality observations.
//!
//! The store is append-only and bounded: once `capacity` records are held,
//! each append evicts the oldest one. It is passed around as an explicit
//! handle (cheap to clone, shared underneath) and is only read by reporting
//! code; nothing in the extraction path consults it.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ParsingMethod;

pub const DEFAULT_CAPACITY: usize = 1000;

/// One observation, emitted once per pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetricRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub site: String,
    pub total_parsed: usize,
    pub valid_jobs: usize,
    pub invalid_jobs: usize,
    pub quality_score: u8,
    /// Error message → number of records carrying it.
    pub common_errors: BTreeMap<String, usize>,
    pub parsing_method: ParsingMethod,
    /// Mean wall time per parsed record, in milliseconds.
    pub average_processing_time_ms: f64,
}

/// Aggregate over every stored observation for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteQuality {
    pub site: String,
    pub batches: usize,
    pub average_quality_score: f64,
    pub min_quality_score: u8,
    pub max_quality_score: u8,
    pub total_parsed: usize,
    pub total_valid: usize,
    pub total_invalid: usize,
    pub dom_batches: usize,
    pub markdown_batches: usize,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MetricsStore {
    records: Arc<RwLock<VecDeque<QualityMetricRecord>>>,
    capacity: usize,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MetricsStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        MetricsStore {
            records: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one observation, evicting the oldest beyond capacity.
    pub fn record(&self, metric: QualityMetricRecord) {
        // Poisoning is ignored: appends are never dropped.
        let mut records = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(metric);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent observations first.
    pub fn list_recent_metrics(&self, limit: usize) -> Vec<QualityMetricRecord> {
        self.records
            .read()
            .map(|r| r.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn aggregate_quality_by_site(&self, site: &str) -> Option<SiteQuality> {
        let records = self.records.read().ok()?;
        let mut matching = records.iter().filter(|m| m.site == site).peekable();
        let first = matching.peek()?;

        let mut agg = SiteQuality {
            site: site.to_string(),
            batches: 0,
            average_quality_score: 0.0,
            min_quality_score: first.quality_score,
            max_quality_score: first.quality_score,
            total_parsed: 0,
            total_valid: 0,
            total_invalid: 0,
            dom_batches: 0,
            markdown_batches: 0,
            last_seen: first.timestamp,
        };
        let mut score_sum = 0u64;

        for m in matching {
            agg.batches += 1;
            score_sum += u64::from(m.quality_score);
            agg.min_quality_score = agg.min_quality_score.min(m.quality_score);
            agg.max_quality_score = agg.max_quality_score.max(m.quality_score);
            agg.total_parsed += m.total_parsed;
            agg.total_valid += m.valid_jobs;
            agg.total_invalid += m.invalid_jobs;
            match m.parsing_method {
                ParsingMethod::Dom => agg.dom_batches += 1,
                ParsingMethod::Markdown => agg.markdown_batches += 1,
            }
            agg.last_seen = agg.last_seen.max(m.timestamp);
        }

        agg.average_quality_score = score_sum as f64 / agg.batches as f64;
        Some(agg)
    }

    /// Distinct sites in first-seen order.
    pub fn sites(&self) -> Vec<String> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        let mut sites: Vec<String> = Vec::new();
        for m in records.iter() {
            if !sites.contains(&m.site) {
                sites.push(m.site.clone());
            }
        }
        sites
    }

    /// Error messages summed over the whole store, most frequent first.
    pub fn top_errors(&self, limit: usize) -> Vec<(String, usize)> {
        let Ok(records) = self.records.read() else {
            return Vec::new();
        };
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for m in records.iter() {
            for (msg, count) in &m.common_errors {
                *totals.entry(msg.as_str()).or_insert(0) += count;
            }
        }
        let mut sorted: Vec<(String, usize)> =
            totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(limit);
        sorted
    }
}
