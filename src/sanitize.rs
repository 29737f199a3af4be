//! Free-text cleanup applied to every candidate before it is judged.
//!
//! One cleaning pass runs in a fixed order: entity decoding, then markup
//! removal, then markdown marker removal, then hazard removal, then
//! whitespace collapse. Markup goes first so markdown cleanup only ever
//! sees plain text. Every removal leaves a space behind so no step can glue
//! two fragments into new markup. The pass is repeated until the text stops
//! changing, at most `MAX_PASSES` times; text still changing after that has
//! its remaining `&`, `<` and `>` blanked, so `sanitize` stays idempotent.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::CandidateRecord;

pub const DEFAULT_MAX_DESCRIPTION_CHARS: usize = 2000;

/// Raw field input is clipped to this many bytes before any regex work.
const RAW_CLIP_BYTES: usize = 64 * 1024;

/// Clean text converges in two passes; only crafted input gets near this.
const MAX_PASSES: usize = 4;

const HAZARD_TAGS: &[&str] = &["script", "style", "iframe", "noscript", "object", "template"];

static HAZARD_BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HAZARD_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<\s*{tag}\b[^>]*>.*?(?:<\s*/\s*{tag}\s*>|\z)")).unwrap()
        })
        .collect()
});
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap());
/// A `<` only opens a tag when a name, `/`, `!` or `?` follows it.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z/!?][^>]*>").unwrap());
static HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)\bon(?:error|load|unload|beforeunload|abort|click|dblclick|auxclick|contextmenu"#,
        r#"|mouse[a-z]*|pointer[a-z]*|touch[a-z]*|key[a-z]*|focus[a-z]*|blur|change|input"#,
        r#"|submit|reset|select|invalid|drag[a-z]*|drop|scroll|wheel|resize|copy|cut|paste"#,
        r#"|animation[a-z]*|transition[a-z]*|toggle|begin|end|play|pause|message|hashchange"#,
        r#"|popstate|pageshow|pagehide|storage|show|search)\s*=\s*(?:"[^"]*"|'[^']*'|\S+)"#,
    ))
    .unwrap()
});
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:java|vb)script\s*:|\bdata\s*:\s*text/html)").unwrap()
});
/// `&amp;amp;…` and its numeric spellings, peeled in one step.
static AMP_CHAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(?:amp;|#0*38;|#x0*26;)+").unwrap());
static MD_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static MD_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*#{1,6}\s+").unwrap());
static MD_HASH_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{2,}").unwrap());

/// What the sanitizer had to do beyond plain cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub description_truncated: bool,
}

/// Sanitize with the default description bound.
pub fn sanitize(record: &CandidateRecord) -> CandidateRecord {
    sanitize_with_report(record, DEFAULT_MAX_DESCRIPTION_CHARS).0
}

pub fn sanitize_with_report(
    record: &CandidateRecord,
    max_description_chars: usize,
) -> (CandidateRecord, SanitizeReport) {
    let description = clean_text(&record.description);
    let (description, truncated) = truncate_chars(&description, max_description_chars);
    if truncated {
        debug!(
            title = %clean_text(&record.title),
            limit = max_description_chars,
            "description truncated"
        );
    }

    let sanitized = CandidateRecord {
        title: clean_text(&record.title),
        company: clean_text(&record.company),
        location: clean_text(&record.location),
        pay: clean_optional(record.pay.as_deref()),
        schedule: clean_optional(record.schedule.as_deref()),
        description,
        url: record.url.as_deref().and_then(sanitize_url),
        source_site: record.source_site.clone(),
    };

    (
        sanitized,
        SanitizeReport {
            description_truncated: truncated,
        },
    )
}

/// Clean one free-text value down to a single line of plain text.
pub fn clean_text(raw: &str) -> String {
    let mut current = clip(raw, RAW_CLIP_BYTES).to_string();
    for _ in 0..MAX_PASSES {
        let next = clean_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
    debug!(len = current.len(), "cleanup did not settle, blanking delimiters");
    collapse_whitespace(&current.replace(['&', '<', '>'], " "))
}

/// Keep http(s) and site-relative links, drop everything else.
pub fn sanitize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    if url.is_empty() || url.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'')) {
        return None;
    }
    let lower = url.to_ascii_lowercase();
    let allowed = lower.starts_with("https://")
        || lower.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"));
    allowed.then(|| url.to_string())
}

fn clean_optional(raw: Option<&str>) -> Option<String> {
    raw.map(clean_text).filter(|s| !s.is_empty())
}

fn clean_pass(text: &str) -> String {
    let text = decode_entities(text);
    let text = strip_markup(&text);
    let text = strip_markdown(&text);
    let text = strip_hazards(&text);
    collapse_whitespace(&text)
}

fn strip_markup(text: &str) -> String {
    let mut out = COMMENT_RE.replace_all(text, " ").into_owned();
    for re in HAZARD_BLOCK_RES.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    let out = TAG_RE.replace_all(&out, " ");
    out.replace(['<', '>'], " ")
}

fn strip_hazards(text: &str) -> String {
    let text = HANDLER_RE.replace_all(text, " ");
    SCHEME_RE.replace_all(&text, " ").into_owned()
}

fn strip_markdown(text: &str) -> String {
    let text = text.replace("**", " ").replace('`', " ");
    let text = MD_IMAGE_RE.replace_all(&text, " ");
    let text = MD_LINK_RE.replace_all(&text, " $1 ");
    let text = MD_HEADING_RE.replace_all(&text, " ");
    MD_HASH_RUN_RE.replace_all(&text, " ").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    text.replace(|c: char| c.is_control(), " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    let text = AMP_CHAIN_RE.replace_all(text, "&");
    html_escape::decode_html_entities(&*text).into_owned()
}

fn clip(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (s[..idx].trim_end().to_string(), true),
        None => (s.to_string(), false),
    }
}
