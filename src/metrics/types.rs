//! Resource-type aggregation
//!
//! Groups request bytes by resource type in two modes:
//! - aggregate: every (URL, run) observation across all runs, modelling
//!   the bandwidth of repeated visits
//! - representative: the raw entries of one run, modelling a single page load
//!
//! Each mode's percentages use that mode's own total as denominator.

use std::collections::BTreeMap;

use crate::metrics::carbon::CarbonEstimator;
use crate::metrics::ratios::{bytes_to_kb, percentage, round_to};
use crate::models::{NetworkEntry, ReconciledResource, ResourceType, TypeSummary};

#[derive(Debug, Default, Clone, Copy)]
struct TypeTotals {
    requests: u64,
    transfer_bytes: u64,
    resource_bytes: u64,
}

impl TypeTotals {
    fn add(self, entry: &NetworkEntry) -> Self {
        Self {
            requests: self.requests + 1,
            transfer_bytes: self.transfer_bytes + entry.transfer_bytes,
            resource_bytes: self.resource_bytes + entry.resource_bytes,
        }
    }
}

/// Per-type totals over every observation of every reconciled URL
pub fn aggregate_by_type(
    resources: &[ReconciledResource],
    estimator: &CarbonEstimator,
) -> Vec<TypeSummary> {
    let observed = resources
        .iter()
        .flat_map(|r| r.observations())
        .map(|o| &o.entry);
    summarize(observed, estimator)
}

/// Per-type totals over the raw entries of a single run
pub fn summarize_run_by_type(
    entries: &[NetworkEntry],
    estimator: &CarbonEstimator,
) -> Vec<TypeSummary> {
    summarize(entries.iter(), estimator)
}

fn summarize<'a>(
    entries: impl Iterator<Item = &'a NetworkEntry>,
    estimator: &CarbonEstimator,
) -> Vec<TypeSummary> {
    let grouped: BTreeMap<ResourceType, TypeTotals> =
        entries.fold(BTreeMap::new(), |mut acc, entry| {
            let totals = acc.entry(entry.resource_type).or_default();
            *totals = totals.add(entry);
            acc
        });

    let total_transfer: u64 = grouped.values().map(|t| t.transfer_bytes).sum();

    grouped
        .into_iter()
        .map(|(resource_type, totals)| TypeSummary {
            resource_type,
            requests: totals.requests,
            transfer_bytes: totals.transfer_bytes,
            resource_bytes: totals.resource_bytes,
            transfer_kb: bytes_to_kb(totals.transfer_bytes as f64),
            resource_kb: bytes_to_kb(totals.resource_bytes as f64),
            transfer_pct: round_to(
                percentage(totals.transfer_bytes as f64, total_transfer as f64),
                1,
            ),
            co2_grams: estimator.grams(totals.transfer_bytes),
        })
        .collect()
}

/// Sum of transfer bytes across a set of type summaries
pub fn total_transfer_bytes(summaries: &[TypeSummary]) -> u64 {
    summaries.iter().map(|s| s.transfer_bytes).sum()
}

/// Sum of uncompressed resource bytes across a set of type summaries
pub fn total_resource_bytes(summaries: &[TypeSummary]) -> u64 {
    summaries.iter().map(|s| s.resource_bytes).sum()
}
