//! Turns untrusted job-listing HTML or markdown into sanitized, validated,
//! deduplicated records with a batch quality score.
//!
//! raw input → [`parser`] → [`sanitize`] → [`classify`] → [`validate`]
//! → [`dedupe`] → [`quality`] → [`metrics`]

pub mod classify;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod quality;
pub mod sanitize;
pub mod validate;

pub use crate::config::Settings;
pub use crate::metrics::{MetricsStore, QualityMetricRecord, SiteQuality};
pub use crate::model::{BatchResult, CandidateRecord, ErrorCode, ParsingMethod, SourceSite, ValidatedRecord};
pub use crate::pipeline::{ExtractionRequest, Pipeline};
