use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{CandidateRecord, SourceSite};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})(?:\s+(.*))?$").unwrap());
static SINGLE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]\(([^)\s]+)\)$").unwrap());
static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:https?://|www\.)\S+$").unwrap());
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap());
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]{1,22}):\s*(.*)$").unwrap());
static PAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(?:[$£€¥]\s?\d|\busd\s?\d)").unwrap());
static SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:full[- ]time|part[- ]time|contract|temporary|temp[- ]to[- ]hire|internship|per diem|seasonal)\b").unwrap()
});
static REMOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:remote|hybrid|on-site|onsite|in-office)\b").unwrap());
static CITY_STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z.' -]*,\s*[A-Z]{2}\b").unwrap());

/// Lines longer than this are description text even if they match a cue.
const MAX_CUE_LINE_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Link { text: String, url: String },
    Labeled { field: Field, value: String },
    Rule,
    Text(String),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Company,
    Location,
    Pay,
    Schedule,
    Url,
    Description,
}

fn label_field(key: &str) -> Option<Field> {
    Some(match key.trim().to_lowercase().as_str() {
        "company" | "employer" | "organization" | "hiring company" => Field::Company,
        "location" | "job location" | "where" => Field::Location,
        "salary" | "pay" | "compensation" | "wage" | "rate" => Field::Pay,
        "job type" | "schedule" | "employment type" | "type" | "hours" => Field::Schedule,
        "url" | "link" | "apply" | "apply here" => Field::Url,
        "description" | "summary" | "about" => Field::Description,
        _ => return None,
    })
}

pub fn classify_lines(markdown: &str) -> Vec<Block> {
    markdown.lines().map(classify_line).collect()
}

fn classify_line(raw: &str) -> Block {
    let line = strip_bullet(raw.trim());
    if line.is_empty() {
        return Block::Empty;
    }
    if RULE_RE.is_match(line) {
        return Block::Rule;
    }
    if let Some(caps) = HEADING_RE.captures(line) {
        return Block::Heading {
            level: caps[1].len() as u8,
            text: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        };
    }
    if let Some(caps) = SINGLE_LINK_RE.captures(line) {
        return Block::Link {
            text: caps[1].to_string(),
            url: caps[2].to_string(),
        };
    }

    // `**Location:** Remote` and `Location: Remote` are the same label
    let plain = line.replace("**", "");
    if let Some(caps) = LABEL_RE.captures(plain.trim()) {
        if let Some(field) = label_field(&caps[1]) {
            return Block::Labeled {
                field,
                value: caps[2].trim().to_string(),
            };
        }
    }

    Block::Text(line.to_string())
}

fn strip_bullet(line: &str) -> &str {
    for bullet in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// Split blocks into listing segments. Level-2 headings start a listing and
/// anything before the first one is page preamble. Documents without any
/// level-2 heading are split on thematic breaks instead.
pub fn segment(blocks: &[Block]) -> Vec<&[Block]> {
    let starts: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b, Block::Heading { level: 2, .. }))
        .map(|(i, _)| i)
        .collect();

    if !starts.is_empty() {
        if starts[0] > 0 {
            debug!(lines = starts[0], "skipping preamble before first listing heading");
        }
        return starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(blocks.len());
                &blocks[start..end]
            })
            .collect();
    }

    blocks
        .split(|b| matches!(b, Block::Rule))
        .filter(|seg| seg.iter().any(|b| !matches!(b, Block::Empty)))
        .collect()
}

/// Turn one segment into a candidate. `None` when the segment yields
/// neither a title nor a company.
pub fn to_candidate(segment: &[Block], source_site: &SourceSite) -> Option<CandidateRecord> {
    let mut record = CandidateRecord::new(source_site.clone());
    let mut description: Vec<String> = Vec::new();
    let mut rest = segment.iter().filter(|b| !matches!(b, Block::Empty | Block::Rule));

    match rest.next()? {
        Block::Heading { text, .. } => match SINGLE_LINK_RE.captures(text) {
            Some(caps) => {
                record.title = caps[1].to_string();
                record.url = Some(caps[2].to_string());
            }
            None => record.title = text.clone(),
        },
        Block::Link { text, url } => {
            record.title = text.clone();
            record.url = Some(url.clone());
        }
        Block::Labeled { field, value } => apply_label(&mut record, &mut description, *field, value),
        Block::Text(t) => record.title = t.clone(),
        Block::Rule | Block::Empty => {}
    }

    let mut company_seen = !record.company.is_empty();
    for block in rest {
        match block {
            Block::Labeled { field, value } => {
                apply_label(&mut record, &mut description, *field, value);
                company_seen |= *field == Field::Company;
            }
            Block::Text(t) if !company_seen => {
                record.company = t.clone();
                company_seen = true;
            }
            Block::Link { text, .. } if !company_seen => {
                record.company = text.clone();
                company_seen = true;
            }
            Block::Text(t) => classify_text(&mut record, &mut description, t),
            Block::Link { text, url } => {
                if record.url.is_none() {
                    record.url = Some(url.clone());
                } else {
                    description.push(text.clone());
                }
            }
            Block::Heading { text, .. } => description.push(text.clone()),
            Block::Rule | Block::Empty => {}
        }
    }

    record.description = description.join("\n");
    if record.title.trim().is_empty() && record.company.trim().is_empty() {
        return None;
    }
    Some(record)
}

fn apply_label(record: &mut CandidateRecord, description: &mut Vec<String>, field: Field, value: &str) {
    let value = value.to_string();
    match field {
        Field::Company => record.company = value,
        Field::Location => record.location = value,
        Field::Pay => record.pay = Some(value),
        Field::Schedule => record.schedule = Some(value),
        Field::Url => {
            let url = SINGLE_LINK_RE
                .captures(&value)
                .map(|caps| caps[2].to_string())
                .unwrap_or(value);
            record.url = Some(url);
        }
        Field::Description => description.push(value),
    }
}

/// Heuristic cues for unlabeled lines; whatever matches nothing is description.
fn classify_text(record: &mut CandidateRecord, description: &mut Vec<String>, line: &str) {
    let short = line.chars().count() <= MAX_CUE_LINE_CHARS;

    if record.url.is_none() && BARE_URL_RE.is_match(line) {
        record.url = Some(line.to_string());
    } else if short && record.pay.is_none() && PAY_RE.is_match(line) {
        record.pay = Some(line.to_string());
    } else if short && record.location.is_empty() && is_location(line) {
        record.location = line.to_string();
    } else if short && record.schedule.is_none() && SCHEDULE_RE.is_match(line) {
        record.schedule = Some(line.to_string());
    } else {
        description.push(line.to_string());
    }
}

fn is_location(line: &str) -> bool {
    let plain = line.replace("**", "");
    REMOTE_RE.is_match(&plain) || CITY_STATE_RE.is_match(plain.trim())
}

/// Markdown strategy: one candidate per listing segment.
pub fn extract(markdown: &str, site_id: &str) -> Vec<CandidateRecord> {
    let source_site = super::source_site_for(site_id);
    let blocks = classify_lines(markdown);
    let segments = segment(&blocks);
    debug!(site = site_id, segments = segments.len(), "markdown segmented");

    segments
        .iter()
        .enumerate()
        .filter_map(|(idx, seg)| {
            let candidate = to_candidate(seg, &source_site);
            if candidate.is_none() {
                debug!(segment = idx, "structural skip: no title or company");
            }
            candidate
        })
        .collect()
}
