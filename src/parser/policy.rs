use std::sync::LazyLock;

use scraper::Selector;
use tracing::warn;

use crate::error::ExtractError;

pub const GENERIC: &str = "generic";

/// Structural cues for one site. Every list is tried in order and the first
/// selector that finds non-empty text wins.
#[derive(Debug)]
pub struct SitePolicy {
    pub id: &'static str,
    pub container: &'static [&'static str],
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub location: &'static [&'static str],
    pub pay: &'static [&'static str],
    pub schedule: &'static [&'static str],
    pub description: &'static [&'static str],
    pub link: &'static [&'static str],
}

/// Site id → field markers. New sites are a new row; `generic` is required
/// and is used for unknown ids and for per-field fallback.
pub static POLICIES: &[SitePolicy] = &[
    SitePolicy {
        id: "indeed",
        container: &["div.job_seen_beacon", "li div.cardOutline", "[data-jk]"],
        title: &["h2.jobTitle span[title]", "h2.jobTitle", "a.jcs-JobTitle"],
        company: &["[data-testid='company-name']", "span.companyName"],
        location: &["[data-testid='text-location']", "div.companyLocation"],
        pay: &["div.salary-snippet-container", "div.metadata.estimated-salary"],
        schedule: &["[data-testid='attribute_snippet_testid']"],
        description: &["div.job-snippet", "[data-testid='jobsnippet_footer']"],
        link: &["h2.jobTitle a[href]", "a.jcs-JobTitle[href]"],
    },
    SitePolicy {
        id: "linkedin",
        container: &["div.base-card", "li.jobs-search-results__list-item", "div.job-search-card"],
        title: &["h3.base-search-card__title", "a.job-card-list__title"],
        company: &["h4.base-search-card__subtitle", "a.job-card-container__company-name"],
        location: &["span.job-search-card__location", "li.job-card-container__metadata-item"],
        pay: &["span.job-search-card__salary-info"],
        schedule: &["span.job-search-card__employment-type"],
        description: &["p.job-search-card__snippet"],
        link: &["a.base-card__full-link[href]", "a.job-card-list__title[href]"],
    },
    SitePolicy {
        id: "glassdoor",
        container: &["li[data-test='jobListing']", "li.react-job-listing"],
        title: &["[data-test='job-title']", "a.jobLink span"],
        company: &["[data-test='employer-name']", "div.jobHeader a"],
        location: &["[data-test='emp-location']", "[data-test='location']"],
        pay: &["[data-test='detailSalary']"],
        schedule: &["[data-test='job-type']"],
        description: &["[data-test='descSnippet']"],
        link: &["a[data-test='job-title'][href]", "a.jobLink[href]"],
    },
    SitePolicy {
        id: "ziprecruiter",
        container: &["article.job_result", "div.job_content", "li.job-listing"],
        title: &["h2.job_title", "a.job_link span.just_job_title"],
        company: &["a.company_name", "p.company_name", "a.t_org_link"],
        location: &["a.company_location", "p.job_location", "span.location"],
        pay: &["p.job_snippet span.salary", "div.value.salary"],
        schedule: &["li.perk_item.job_type"],
        description: &["p.job_snippet", "div.job_snippet"],
        link: &["a.job_link[href]", "h2.job_title a[href]"],
    },
    SitePolicy {
        id: "monster",
        container: &["[data-testid='svx-job-card']", "div.job-cardstyle__JobCardComponent"],
        title: &["[data-testid='svx-job-title']", "h3.job-cardstyle__JobCardTitle"],
        company: &["[data-testid='company']", "span.job-cardstyle__JobCardCompany"],
        location: &["[data-testid='jobDetailLocation']", "span.job-cardstyle__JobCardLocation"],
        pay: &["[data-testid='jobDetailSalary']"],
        schedule: &["[data-testid='jobDetailJobType']"],
        description: &["[data-testid='svx-job-description']"],
        link: &["a[data-testid='svx-job-title'][href]"],
    },
    SitePolicy {
        id: GENERIC,
        container: &[
            "[data-job-id]",
            "[data-jobid]",
            "[itemtype*='JobPosting']",
            ".job-card",
            ".job-listing",
            ".job-result",
            ".job-item",
            ".job",
            "li.result",
            "article",
        ],
        title: &[
            "[itemprop='title']",
            "[class*='job-title']",
            "[class*='jobTitle']",
            "[class*='title']",
            "h2",
            "h3",
            "h1",
            "h4",
        ],
        company: &[
            "[itemprop='hiringOrganization']",
            "[class*='company']",
            "[class*='employer']",
            "[data-testid*='company']",
            "[class*='organization']",
        ],
        location: &[
            "[itemprop='jobLocation']",
            "[class*='location']",
            "[data-testid*='location']",
        ],
        pay: &[
            "[itemprop='baseSalary']",
            "[class*='salary']",
            "[class*='pay']",
            "[class*='compensation']",
            "[class*='wage']",
        ],
        schedule: &[
            "[itemprop='employmentType']",
            "[class*='job-type']",
            "[class*='jobType']",
            "[class*='schedule']",
            "[class*='employment']",
        ],
        description: &[
            "[itemprop='description']",
            "[class*='description']",
            "[class*='snippet']",
            "[class*='summary']",
            "p",
        ],
        link: &["a[href][class*='title']", "h2 a[href]", "h3 a[href]", "a[href]"],
    },
];

/// A policy with its selectors parsed.
#[derive(Debug)]
pub struct CompiledPolicy {
    pub id: &'static str,
    pub container: Vec<Selector>,
    pub title: Vec<Selector>,
    pub company: Vec<Selector>,
    pub location: Vec<Selector>,
    pub pay: Vec<Selector>,
    pub schedule: Vec<Selector>,
    pub description: Vec<Selector>,
    pub link: Vec<Selector>,
}

impl CompiledPolicy {
    pub fn compile(policy: &SitePolicy) -> Result<Self, ExtractError> {
        let parse = |list: &'static [&'static str]| -> Result<Vec<Selector>, ExtractError> {
            list.iter()
                .map(|&sel| {
                    Selector::parse(sel).map_err(|e| ExtractError::InvalidSelector {
                        site: policy.id,
                        selector: sel,
                        reason: e.to_string(),
                    })
                })
                .collect()
        };
        Ok(CompiledPolicy {
            id: policy.id,
            container: parse(policy.container)?,
            title: parse(policy.title)?,
            company: parse(policy.company)?,
            location: parse(policy.location)?,
            pay: parse(policy.pay)?,
            schedule: parse(policy.schedule)?,
            description: parse(policy.description)?,
            link: parse(policy.link)?,
        })
    }
}

static COMPILED: LazyLock<Vec<Result<CompiledPolicy, ExtractError>>> =
    LazyLock::new(|| POLICIES.iter().map(CompiledPolicy::compile).collect());

/// Ids of every policy row, `generic` included.
pub fn known_sites() -> impl Iterator<Item = &'static str> {
    POLICIES.iter().map(|p| p.id)
}

/// Exact, case-sensitive lookup of a site id.
pub fn is_known(site_id: &str) -> bool {
    site_id != GENERIC && POLICIES.iter().any(|p| p.id == site_id)
}

fn compiled(site_id: &str) -> Option<&'static CompiledPolicy> {
    let idx = POLICIES.iter().position(|p| p.id == site_id)?;
    match &COMPILED[idx] {
        Ok(policy) => Some(policy),
        Err(e) => {
            warn!(site = site_id, error = %e, "site policy failed to compile");
            None
        }
    }
}

/// The generic policy. Returns an error only if its own selectors are broken.
pub fn generic() -> Result<&'static CompiledPolicy, ExtractError> {
    let idx = POLICIES
        .iter()
        .position(|p| p.id == GENERIC)
        .unwrap_or(POLICIES.len() - 1);
    COMPILED[idx].as_ref().map_err(Clone::clone)
}

/// Policy for `site_id`, or `None` when the generic policy should be used.
pub fn site(site_id: &str) -> Option<&'static CompiledPolicy> {
    if site_id == GENERIC {
        return None;
    }
    compiled(site_id)
}
