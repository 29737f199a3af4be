use std::fs;
use std::thread;

use listing_pipeline::pipeline::NO_LISTINGS_ERROR;
use listing_pipeline::sanitize::sanitize;
use listing_pipeline::{
    ErrorCode, ExtractionRequest, MetricsStore, ParsingMethod, Pipeline, Settings, SourceSite,
};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

#[test]
fn scenario_five_containers() {
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::html("generic", fixture("scenario.html")));

    assert_eq!(result.parsing_method, ParsingMethod::Dom);
    assert_eq!(result.parsed, 4);
    assert_eq!(result.valid, 3);
    assert_eq!(result.invalid, 1);
    assert_eq!(result.quality_score, 75);
    assert_eq!(result.duplicates, 0);

    let titles: Vec<&str> = result.records.iter().map(|r| r.record.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Senior Accountant", "Payroll Specialist", "Accounts Payable Clerk"]
    );
    assert!(result.records.iter().all(|r| r.quality_contribution == 100));
    assert_eq!(result.records[0].record.url.as_deref(), Some("/jobs/101"));

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("No results found"));
}

#[test]
fn scenario_metrics_recorded() {
    let pipeline = Pipeline::default();
    let request = ExtractionRequest {
        html: fixture("scenario.html"),
        site_id: "generic".into(),
        session_id: Some("search-42".into()),
        ..Default::default()
    };
    pipeline.run(&request);

    let recent = pipeline.metrics().list_recent_metrics(10);
    assert_eq!(recent.len(), 1);
    let m = &recent[0];
    assert_eq!(m.session_id, "search-42");
    assert_eq!(m.site, "generic");
    assert_eq!(m.total_parsed, 4);
    assert_eq!(m.valid_jobs, 3);
    assert_eq!(m.invalid_jobs, 1);
    assert_eq!(m.quality_score, 75);
    assert_eq!(m.parsing_method, ParsingMethod::Dom);
    assert_eq!(m.common_errors.get("suspicious content"), Some(&1));
    assert_eq!(m.common_errors.get("missing pay"), Some(&1));

    let agg = pipeline.metrics().aggregate_quality_by_site("generic").unwrap();
    assert_eq!(agg.batches, 1);
    assert_eq!(agg.average_quality_score, 75.0);
}

#[test]
fn site_policy_from_fixture() {
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::html("linkedin", fixture("linkedin.html")));

    assert_eq!(result.parsed, 2);
    assert_eq!(result.valid, 2);
    assert_eq!(result.quality_score, 100);

    let first = &result.records[0];
    assert_eq!(first.record.title, "Product Designer");
    assert_eq!(first.record.company, "Figment Labs");
    assert_eq!(first.record.location, "New York, NY");
    assert_eq!(first.record.pay.as_deref(), Some("$120,000 - $140,000"));
    assert_eq!(first.record.source_site, SourceSite::Known("linkedin"));
    assert_eq!(first.record.url.as_deref(), Some("https://www.linkedin.com/jobs/view/1"));
    assert_eq!(first.validation_errors, vec![ErrorCode::ShortDescription]);
    assert_eq!(first.quality_contribution, 80);

    let second = &result.records[1];
    assert_eq!(
        second.validation_errors,
        vec![ErrorCode::ShortDescription, ErrorCode::MissingPay]
    );
    assert_eq!(second.quality_contribution, 70);
}

#[test]
fn unrecognized_site_falls_back_to_generic() {
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::html("LinkedIn", fixture("scenario.html")));
    assert_eq!(result.parsed, 4);
    assert!(result.records.iter().all(|r| r.record.source_site == SourceSite::Generic));
}

#[test]
fn hostile_markup_neutralized() {
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::html("generic", fixture("hostile.html")));
    assert_eq!(result.parsed, 1);

    let json = serde_json::to_string(&result).unwrap().to_lowercase();
    for needle in ["<script", "<img", "<iframe", "onerror", "onclick", "javascript:"] {
        assert!(!json.contains(needle), "{needle} survived: {json}");
    }

    let record = &result.records[0].record;
    assert_eq!(record.title, "Line Cook");
    assert_eq!(record.company, "Blue Plate");
    assert_eq!(record.pay.as_deref(), Some("$18 an hour"));
    assert!(record.description.contains("cook dishes for dinner service"));
    assert!(record.url.is_none());
}

#[test]
fn sanitize_is_idempotent_on_extracted_records() {
    for name in ["scenario.html", "hostile.html", "linkedin.html"] {
        let records = listing_pipeline::parser::extract(&fixture(name), "", "generic");
        for record in records {
            let once = sanitize(&record);
            assert_eq!(sanitize(&once), once, "{name}");
        }
    }
}

#[test]
fn markdown_listings() {
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::markdown("indeed", fixture("listings.md")));

    assert_eq!(result.parsing_method, ParsingMethod::Markdown);
    assert_eq!(result.parsed, 3);
    assert_eq!(result.valid, 2);
    assert_eq!(result.invalid, 1);
    assert_eq!(result.quality_score, 67);

    let first = &result.records[0];
    assert_eq!(first.record.title, "Warehouse Associate");
    assert_eq!(first.record.company, "Acme Logistics");
    assert_eq!(first.record.location, "Reno, NV");
    assert_eq!(first.record.schedule.as_deref(), Some("Full-time"));
    assert_eq!(first.record.url.as_deref(), Some("https://jobs.example.com/view/1"));
    assert_eq!(first.record.source_site, SourceSite::Known("indeed"));
    assert_eq!(first.quality_contribution, 100);

    let second = &result.records[1];
    assert_eq!(second.record.company, "Northwind Supply");
    assert_eq!(second.record.pay.as_deref(), Some("$24 an hour"));
}

#[test]
fn html_preferred_over_markdown() {
    let pipeline = Pipeline::default();
    let request = ExtractionRequest {
        html: fixture("scenario.html"),
        markdown: fixture("listings.md"),
        site_id: "generic".into(),
        session_id: None,
    };
    let result = pipeline.run(&request);
    assert_eq!(result.parsing_method, ParsingMethod::Dom);
    assert_eq!(result.parsed, 4);
}

#[test]
fn duplicates_within_batch_collapse() {
    let md = "## Data Analyst\nAcme\nRemote\n$80,000 a year\nBuild weekly revenue dashboards in SQL.\n\n\
              ## data analyst \nACME\nRemote\n$80,000 a year\nBuild weekly revenue dashboards in SQL.\n";
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::markdown("generic", md));

    assert_eq!(result.parsed, 2);
    assert_eq!(result.valid, 2);
    assert_eq!(result.duplicates, 1);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].record.title, "Data Analyst");
    assert_eq!(result.quality_score, 100);
}

#[test]
fn no_usable_input() {
    let pipeline = Pipeline::default();
    let cases = [
        (ExtractionRequest::default(), 0),
        (ExtractionRequest::html("generic", "<html><body><p>Maintenance</p></body></html>"), 0),
        (ExtractionRequest::markdown("generic", "just some text without structure\n"), 1),
    ];
    for (request, expected_parsed) in cases {
        let result = pipeline.run(&request);
        assert_eq!(result.parsed, expected_parsed, "{request:?}");
        assert_eq!(result.valid, 0);
        assert_eq!(result.quality_score, 0);
        assert!(result.records.is_empty());
        let no_listings = result.errors.iter().any(|e| e == NO_LISTINGS_ERROR);
        assert_eq!(no_listings, expected_parsed == 0, "{:?}", result.errors);
    }
}

#[test]
fn suspicious_record_rejected_and_reasons_kept() {
    let md = "## Saved search: nurse jobs\nSign in to manage alerts\nRemote\n$40 an hour\nThis is a notification banner, not a job.";
    let pipeline = Pipeline::default();
    let result = pipeline.run(&ExtractionRequest::markdown("generic", md));
    assert_eq!(result.parsed, 1);
    assert_eq!(result.valid, 0);
    assert!(result.records.is_empty());
    assert!(result.errors[0].contains("suspicious content"));
    assert!(result.errors[0].contains("saved search"));
}

#[test]
fn score_always_in_bounds() {
    let pipeline = Pipeline::default();
    for name in ["scenario.html", "hostile.html", "linkedin.html", "listings.md"] {
        let request = if name.ends_with(".md") {
            ExtractionRequest::markdown("generic", fixture(name))
        } else {
            ExtractionRequest::html("generic", fixture(name))
        };
        let result = pipeline.run(&request);
        assert!(result.quality_score <= 100);
        assert_eq!(result.valid + result.invalid, result.parsed);
    }
}

#[test]
fn concurrent_runs_share_one_store() {
    let store = MetricsStore::new(500);
    let pipeline = Pipeline::new(Settings::default(), store.clone());
    let html = fixture("scenario.html");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pipeline = pipeline.clone();
            let html = html.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let result = pipeline.run(&ExtractionRequest::html(&format!("site{t}"), html.clone()));
                    assert_eq!(result.quality_score, 75);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.len(), 80);
    assert_eq!(store.sites().len(), 8);
    assert_eq!(store.aggregate_quality_by_site("site3").unwrap().batches, 10);
}

#[test]
fn metrics_bounded_by_settings() {
    let settings = Settings {
        metrics_capacity: 3,
        ..Settings::default()
    };
    let pipeline = Pipeline::from_settings(settings);
    for _ in 0..5 {
        pipeline.run(&ExtractionRequest::default());
    }
    assert_eq!(pipeline.metrics().len(), 3);
    assert_eq!(pipeline.metrics().capacity(), 3);
}
