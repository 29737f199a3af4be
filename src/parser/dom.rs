use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::policy::{self, CompiledPolicy};
use crate::error::ExtractError;
use crate::model::{CandidateRecord, SourceSite};

/// Containers with more text than this are treated as page wrappers, not cards.
const MAX_CONTAINER_TEXT_BYTES: usize = 512 * 1024;

/// Slice an HTML document into candidate records using the site's policy,
/// falling back to the generic policy for containers and for each field.
pub fn extract(html: &str, site_id: &str) -> Vec<CandidateRecord> {
    let generic = match policy::generic() {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "generic policy unusable, no DOM extraction");
            return Vec::new();
        }
    };
    let site = policy::site(site_id);
    let source_site = match site {
        Some(p) => SourceSite::Known(p.id),
        None => SourceSite::Generic,
    };

    let document = Html::parse_document(html);
    let containers = site
        .map(|p| find_containers(&document, &p.container))
        .filter(|found| !found.is_empty())
        .unwrap_or_else(|| find_containers(&document, &generic.container));
    debug!(site = site_id, containers = containers.len(), "containers located");

    let mut out = Vec::with_capacity(containers.len());
    for (idx, container) in containers.iter().enumerate() {
        match extract_container(*container, site, generic, &source_site) {
            Ok(Some(record)) => out.push(record),
            Ok(None) => debug!(container = idx, "structural skip: no title or company"),
            Err(e) => warn!(container = idx, error = %e, "container skipped"),
        }
    }
    out
}

/// First container selector with any match wins; nested matches are pruned
/// to their outermost element.
fn find_containers<'a>(document: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    for sel in selectors {
        let found: Vec<ElementRef<'a>> = document.select(sel).collect();
        if !found.is_empty() {
            return outermost(found);
        }
    }
    Vec::new()
}

fn outermost(elements: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let ids: HashSet<_> = elements.iter().map(|e| e.id()).collect();
    elements
        .into_iter()
        .filter(|e| !e.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

fn extract_container(
    container: ElementRef<'_>,
    site: Option<&CompiledPolicy>,
    generic: &CompiledPolicy,
    source_site: &SourceSite,
) -> Result<Option<CandidateRecord>, ExtractError> {
    let size: usize = container.text().map(str::len).sum();
    if size > MAX_CONTAINER_TEXT_BYTES {
        return Err(ExtractError::ContainerTooLarge {
            size,
            limit: MAX_CONTAINER_TEXT_BYTES,
        });
    }

    // An element claimed by one field is not offered to later fields.
    let mut used: Vec<ElementRef<'_>> = Vec::new();
    let mut field = |pick: fn(&CompiledPolicy) -> &[Selector]| -> Option<String> {
        let el = find_field(container, site.map(pick), pick(generic), &used)?;
        used.push(el);
        Some(el.inner_html())
    };

    let title = field(|p| p.title.as_slice());
    let company = field(|p| p.company.as_slice());
    if title.is_none() && company.is_none() {
        return Ok(None);
    }
    let location = field(|p| p.location.as_slice());
    let pay = field(|p| p.pay.as_slice());
    let schedule = field(|p| p.schedule.as_slice());
    let description = field(|p| p.description.as_slice());

    let url = site
        .map(|p| p.link.as_slice())
        .into_iter()
        .flatten()
        .chain(generic.link.iter())
        .find_map(|sel| container.select(sel).find_map(|a| a.value().attr("href")))
        .map(str::to_string);

    Ok(Some(CandidateRecord {
        title: title.unwrap_or_default(),
        company: company.unwrap_or_default(),
        location: location.unwrap_or_default(),
        pay,
        schedule,
        description: description.unwrap_or_default(),
        url,
        source_site: source_site.clone(),
    }))
}

fn find_field<'a>(
    container: ElementRef<'a>,
    site: Option<&[Selector]>,
    generic: &[Selector],
    used: &[ElementRef<'a>],
) -> Option<ElementRef<'a>> {
    site.into_iter()
        .flatten()
        .chain(generic.iter())
        .find_map(|sel| {
            container
                .select(sel)
                .find(|el| !used.contains(el) && has_text(el))
        })
}

fn has_text(el: &ElementRef<'_>) -> bool {
    el.text().any(|t| !t.trim().is_empty())
}
