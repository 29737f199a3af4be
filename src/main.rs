use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use listing_pipeline::parser::policy;
use listing_pipeline::{BatchResult, ExtractionRequest, Pipeline, Settings};

#[derive(Parser)]
#[command(name = "listing-pipeline", about = "Extract and score job listings from scraped HTML or markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction and print the batch result as JSON
    Extract {
        /// HTML input file
        #[arg(long)]
        html: Option<PathBuf>,
        /// Markdown input file
        #[arg(long)]
        markdown: Option<PathBuf>,
        /// Site id from the policy table (unknown ids use `generic`)
        #[arg(short, long, default_value = "generic")]
        site: String,
        /// Session id to tag the metrics record with
        #[arg(long)]
        session: Option<String>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Run every *.html / *.md file in a directory and report per-site quality
    Batch {
        dir: PathBuf,
        /// Site id for every file (default: file name prefix before `_`)
        #[arg(short, long)]
        site: Option<String>,
        /// Number of error messages to show
        #[arg(short = 'n', long, default_value = "5")]
        top: usize,
    },
    /// List the site policy table
    Sites,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            html,
            markdown,
            site,
            session,
            pretty,
        } => {
            if html.is_none() && markdown.is_none() {
                bail!("pass --html and/or --markdown");
            }
            let settings = Settings::load().context("loading settings")?;
            let pipeline = Pipeline::from_settings(settings);
            let request = ExtractionRequest {
                html: read_optional(html.as_deref())?,
                markdown: read_optional(markdown.as_deref())?,
                site_id: site,
                session_id: session,
            };
            let result = pipeline.run(&request);
            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
        }
        Commands::Batch { dir, site, top } => {
            let settings = Settings::load().context("loading settings")?;
            let pipeline = Pipeline::from_settings(settings);
            let files = input_files(&dir)?;
            if files.is_empty() {
                println!("No .html or .md files in {}", dir.display());
                return Ok(());
            }
            println!("Extracting {} files...", files.len());
            let results = run_batch(&pipeline, &files, site.as_deref())?;
            print_report(&pipeline, &results, top);
            println!("\nDone in {:.1}s", t0.elapsed().as_secs_f64());
        }
        Commands::Sites => {
            for id in policy::known_sites() {
                let marker = if policy::is_known(id) { "" } else { " (fallback)" };
                println!("{id}{marker}");
            }
        }
    }

    Ok(())
}

fn read_optional(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p).with_context(|| format!("reading {}", p.display())),
        None => Ok(String::new()),
    }
}

fn input_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if matches!(path.extension().and_then(|e| e.to_str()), Some("html" | "htm" | "md")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `indeed_page2.html` → `indeed`.
fn site_from_file_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('_').next())
        .filter(|s| !s.is_empty())
        .unwrap_or(policy::GENERIC)
        .to_string()
}

fn run_batch(
    pipeline: &Pipeline,
    files: &[PathBuf],
    site: Option<&str>,
) -> anyhow::Result<Vec<BatchResult>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results = files
        .par_iter()
        .map(|path| {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let site_id = site.map(str::to_string).unwrap_or_else(|| site_from_file_name(path));
            let request = if path.extension().and_then(|e| e.to_str()) == Some("md") {
                ExtractionRequest::markdown(&site_id, text)
            } else {
                ExtractionRequest::html(&site_id, text)
            };
            let result = pipeline.run(&request);
            pb.inc(1);
            Ok(result)
        })
        .collect::<anyhow::Result<Vec<_>>>();

    pb.finish_and_clear();
    results
}

fn print_report(pipeline: &Pipeline, results: &[BatchResult], top: usize) {
    let metrics = pipeline.metrics();

    println!(
        "{:<14} | {:>7} | {:>6} | {:>6} | {:>7} | {:>9} | {:>3}/{:<3}",
        "Site", "Batches", "Parsed", "Valid", "Invalid", "Avg score", "Min", "Max"
    );
    println!("{}", "-".repeat(78));
    for site in metrics.sites() {
        if let Some(agg) = metrics.aggregate_quality_by_site(&site) {
            println!(
                "{:<14} | {:>7} | {:>6} | {:>6} | {:>7} | {:>9.1} | {:>3}/{:<3}",
                site,
                agg.batches,
                agg.total_parsed,
                agg.total_valid,
                agg.total_invalid,
                agg.average_quality_score,
                agg.min_quality_score,
                agg.max_quality_score
            );
        }
    }

    let duplicates: usize = results.iter().map(|r| r.duplicates).sum();
    let empty = results.iter().filter(|r| r.parsed == 0).count();
    println!("\n{} batches | {} duplicates dropped | {} with no listings", results.len(), duplicates, empty);

    let errors = metrics.top_errors(top);
    if !errors.is_empty() {
        println!("\n--- Top errors ---");
        for (msg, count) in errors {
            println!("  {count:>5}  {msg}");
        }
    }
}
