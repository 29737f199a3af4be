pub mod blocks;
pub mod dom;
pub mod policy;

use tracing::debug;

use crate::config::InputPrecedence;
use crate::model::{CandidateRecord, ParsingMethod, SourceSite};

/// Extract candidates with HTML taking precedence over markdown and no
/// fallback between inputs.
pub fn extract(html: &str, markdown: &str, site_id: &str) -> Vec<CandidateRecord> {
    extract_with(html, markdown, site_id, InputPrecedence::Html, false).1
}

/// Pick the strategy once for this input. When the preferred input yields
/// no candidates and `fallback` is set, the other input is tried instead.
pub fn extract_with(
    html: &str,
    markdown: &str,
    site_id: &str,
    precedence: InputPrecedence,
    fallback: bool,
) -> (ParsingMethod, Vec<CandidateRecord>) {
    let has_html = !html.trim().is_empty();
    let has_markdown = !markdown.trim().is_empty();

    let primary = match (precedence, has_html, has_markdown) {
        (InputPrecedence::Html, true, _) | (InputPrecedence::Markdown, true, false) => ParsingMethod::Dom,
        _ => ParsingMethod::Markdown,
    };
    let records = run(primary, html, markdown, site_id);

    let other = match primary {
        ParsingMethod::Dom => ParsingMethod::Markdown,
        ParsingMethod::Markdown => ParsingMethod::Dom,
    };
    let other_present = match other {
        ParsingMethod::Dom => has_html,
        ParsingMethod::Markdown => has_markdown,
    };
    if records.is_empty() && fallback && other_present {
        debug!(from = %primary, to = %other, "no candidates, falling back to other input");
        return (other, run(other, html, markdown, site_id));
    }
    (primary, records)
}

fn run(method: ParsingMethod, html: &str, markdown: &str, site_id: &str) -> Vec<CandidateRecord> {
    match method {
        ParsingMethod::Dom => dom::extract(html, site_id),
        ParsingMethod::Markdown => blocks::extract(markdown, site_id),
    }
}

/// Site tag for records of `site_id`; unknown ids are tagged generic.
pub(crate) fn source_site_for(site_id: &str) -> SourceSite {
    policy::known_sites()
        .find(|&id| id == site_id && policy::is_known(id))
        .map(SourceSite::Known)
        .unwrap_or(SourceSite::Generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<div class="job-card"><h2>Baker</h2><span class="company">Crumbs</span></div>"#;
    const MD: &str = "## Barista\nBean Co\nRemote";

    #[test]
    fn html_wins_by_default() {
        let (method, records) = extract_with(HTML, MD, "generic", InputPrecedence::Html, true);
        assert_eq!(method, ParsingMethod::Dom);
        assert!(records[0].title.contains("Baker"));
        assert_eq!(extract(HTML, MD, "generic").len(), 1);
    }

    #[test]
    fn markdown_precedence() {
        let (method, records) = extract_with(HTML, MD, "generic", InputPrecedence::Markdown, true);
        assert_eq!(method, ParsingMethod::Markdown);
        assert_eq!(records[0].title, "Barista");
    }

    #[test]
    fn markdown_when_html_empty() {
        let (method, records) = extract_with("  ", MD, "indeed", InputPrecedence::Html, false);
        assert_eq!(method, ParsingMethod::Markdown);
        assert_eq!(records[0].source_site, SourceSite::Known("indeed"));
    }

    #[test]
    fn fallback_to_markdown_when_html_has_no_containers() {
        let html = "<html><body><p>nothing here</p></body></html>";
        let (method, records) = extract_with(html, MD, "generic", InputPrecedence::Html, true);
        assert_eq!(method, ParsingMethod::Markdown);
        assert_eq!(records.len(), 1);

        let (method, records) = extract_with(html, MD, "generic", InputPrecedence::Html, false);
        assert_eq!(method, ParsingMethod::Dom);
        assert!(records.is_empty());
    }

    #[test]
    fn both_empty() {
        let (method, records) = extract_with("", "", "generic", InputPrecedence::Html, true);
        assert_eq!(method, ParsingMethod::Markdown);
        assert!(records.is_empty());
    }

    #[test]
    fn source_site_tags() {
        assert_eq!(source_site_for("linkedin"), SourceSite::Known("linkedin"));
        assert_eq!(source_site_for("LinkedIn"), SourceSite::Generic);
        assert_eq!(source_site_for("generic"), SourceSite::Generic);
    }
}
