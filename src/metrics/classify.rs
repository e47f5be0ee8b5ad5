//! Request classification
//!
//! First/third-party labelling, cache-control and initiator annotation
//! from the network-activity log, and the per-hostname cache summary.
//!
//! One first-party rule is used everywhere: after stripping a leading
//! `www.`, a hostname is first-party when it equals, or is a subdomain of,
//! the site's host or one of the configured parent-organization domains.

use std::collections::BTreeMap;

use url::Url;

use crate::metrics::ratios::{percentage, round_to};
use crate::models::{CacheSummary, DataQualityIssue, NetworkEntry, Party, ReconciledResource};
use crate::parser::devtools::NetworkLog;

/// Hostname, origin and party of a parsed request URL
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub host: String,
    pub origin: String,
    pub party: Party,
}

/// Decides which hostnames count as first-party for a site
#[derive(Debug, Clone, PartialEq)]
pub struct PartyMatcher {
    first_party_hosts: Vec<String>,
}

impl PartyMatcher {
    /// Build a matcher from the site (bare domain or origin URL) and the
    /// parent-organization domains that also count as first-party
    pub fn for_site(site: &str, parent_domains: &[String]) -> Self {
        let mut first_party_hosts = Vec::new();

        if let Some(host) = site_host(site) {
            first_party_hosts.push(normalize_host(&host));
        }
        for domain in parent_domains {
            let host = normalize_host(domain.trim());
            if !host.is_empty() && !first_party_hosts.contains(&host) {
                first_party_hosts.push(host);
            }
        }

        Self { first_party_hosts }
    }

    pub fn first_party_hosts(&self) -> &[String] {
        &self.first_party_hosts
    }

    /// Label a hostname by suffix match on label boundaries
    pub fn classify_host(&self, host: &str) -> Party {
        let host = normalize_host(host);
        let is_first = self.first_party_hosts.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });

        if is_first {
            Party::First
        } else {
            Party::Third
        }
    }

    /// Parse and label a request URL.
    ///
    /// Returns a reason string when the URL cannot be parsed or has no host.
    pub fn classify_url(&self, raw: &str) -> Result<Classified, String> {
        let parsed = Url::parse(raw).map_err(|e| e.to_string())?;
        let host = parsed
            .host_str()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| "URL has no hostname".to_string())?
            .to_string();

        Ok(Classified {
            origin: parsed.origin().ascii_serialization(),
            party: self.classify_host(&host),
            host,
        })
    }
}

/// Hostname of a site given as a bare domain or an origin URL
pub fn site_domain(site: &str) -> String {
    site_host(site).unwrap_or_else(|| site.trim().to_string())
}

fn site_host(site: &str) -> Option<String> {
    let site = site.trim();
    if site.contains("://") {
        Url::parse(site).ok()?.host_str().map(str::to_string)
    } else {
        let host = site.split('/').next().unwrap_or_default();
        (!host.is_empty()).then(|| host.to_string())
    }
}

/// Lowercase and strip a single leading `www.`
pub fn normalize_host(host: &str) -> String {
    let lower = host.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Fill cache-control and initiator from the run's network-activity log.
///
/// Values from the log take precedence; an entry keeps what the trace
/// reported when the log has nothing for its URL.
pub fn annotate_entries(entries: Vec<NetworkEntry>, log: &NetworkLog) -> Vec<NetworkEntry> {
    entries
        .into_iter()
        .map(|mut entry| {
            if let Some(annotation) = log.get(&entry.url) {
                if let Some(cache_control) = &annotation.cache_control {
                    entry.cache_control = cache_control.clone();
                }
                if let Some(initiator) = annotation.initiator.as_ref().filter(|i| !i.is_empty()) {
                    entry.initiator = initiator.clone();
                }
            }
            entry
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct PartyCounts {
    first: u64,
    third: u64,
}

impl PartyCounts {
    fn add(self, party: Party) -> Self {
        match party {
            Party::First => Self {
                first: self.first + 1,
                ..self
            },
            Party::Third => Self {
                third: self.third + 1,
                ..self
            },
        }
    }

    fn into_row(self, domain: String) -> CacheSummary {
        let total = self.first + self.third;
        CacheSummary {
            domain,
            total_requests: total,
            first_party: self.first,
            third_party: self.third,
            pct_first_party: round_to(percentage(self.first as f64, total as f64), 1),
            pct_third_party: round_to(percentage(self.third as f64, total as f64), 1),
        }
    }
}

/// Per-hostname request counts over the distinct URLs of a site, plus a
/// TOTAL row. URLs that fail to parse are left out and reported.
pub fn build_cache_summary(
    resources: &[ReconciledResource],
    matcher: &PartyMatcher,
) -> (Vec<CacheSummary>, Vec<DataQualityIssue>) {
    let mut by_host: BTreeMap<String, PartyCounts> = BTreeMap::new();
    let mut total = PartyCounts::default();
    let mut issues = Vec::new();

    for resource in resources {
        match matcher.classify_url(&resource.url) {
            Ok(classified) => {
                let counts = by_host.entry(classified.host).or_default();
                *counts = counts.add(classified.party);
                total = total.add(classified.party);
            }
            Err(reason) => {
                tracing::warn!("Skipping malformed URL in cache summary: {} ({})", resource.url, reason);
                issues.push(DataQualityIssue::MalformedUrl {
                    url: resource.url.clone(),
                    reason,
                });
            }
        }
    }

    let mut rows: Vec<CacheSummary> = by_host
        .into_iter()
        .map(|(host, counts)| counts.into_row(host))
        .collect();
    rows.push(total.into_row(CacheSummary::TOTAL_LABEL.to_string()));

    (rows, issues)
}
