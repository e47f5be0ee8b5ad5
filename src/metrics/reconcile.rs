//! Cross-run reconciliation
//!
//! Merges the network entries of every run into one record per URL with
//! run-indexed observations.

use std::collections::BTreeMap;

use crate::metrics::carbon::CarbonEstimator;
use crate::metrics::classify::PartyMatcher;
use crate::models::{NetworkEntry, ReconciledResource, RunObservation};

/// Build one `ReconciledResource` per distinct URL across all runs.
///
/// `runs[i]` are the entries of run `i + 1`, one per URL as produced by the
/// report parser. A URL missing from a run leaves that run's slot empty.
/// Output is ordered by URL.
pub fn reconcile_resources(
    runs: &[Vec<NetworkEntry>],
    matcher: &PartyMatcher,
    estimator: &CarbonEstimator,
) -> Vec<ReconciledResource> {
    let run_count = runs.len();
    let mut by_url: BTreeMap<&str, Vec<Option<RunObservation>>> = BTreeMap::new();

    for (index, entries) in runs.iter().enumerate() {
        for entry in entries {
            let slots = by_url
                .entry(entry.url.as_str())
                .or_insert_with(|| vec![None; run_count]);

            slots[index] = Some(RunObservation {
                co2_grams: estimator.grams(entry.transfer_bytes),
                entry: entry.clone(),
            });
        }
    }

    by_url
        .into_iter()
        .map(|(url, runs)| {
            let classified = matcher.classify_url(url).ok();
            ReconciledResource {
                url: url.to_string(),
                origin: classified.as_ref().map(|c| c.origin.clone()),
                party: classified.map(|c| c.party),
                runs,
            }
        })
        .collect()
}
