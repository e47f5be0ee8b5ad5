//! Performance report parser
//!
//! Turns one raw performance report into a `RunMetrics` record and the
//! run's list of network entries.

use std::collections::HashMap;

use serde_json::Value;

use crate::metrics::carbon::CarbonEstimator;
use crate::metrics::classify::PartyMatcher;
use crate::metrics::ratios::bytes_to_kb;
use crate::models::{Iteration, NetworkEntry, Party, ResourceType, RunMetrics};

const NETWORK_ITEMS: &str = "/audits/network-requests/details/items";
const LONG_TASK_ITEMS: &str = "/audits/long-tasks/details/items";
const PERFORMANCE_SCORE: &str = "/categories/performance/score";

/// Metrics and entries extracted from one report
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRun {
    pub metrics: RunMetrics,
    pub entries: Vec<NetworkEntry>,
    /// The report carried no network-requests detail
    pub missing_network_data: bool,
}

/// Parse one run's report.
///
/// Byte and request totals are summed from the network entries rather than
/// read from any precomputed field. Absent numeric fields count as 0.
pub fn parse_report(
    report: &Value,
    run_number: u32,
    filename: &str,
    matcher: &PartyMatcher,
    estimator: &CarbonEstimator,
) -> ParsedRun {
    let entries = network_entries(report);
    let missing_network_data = entries.is_empty();
    if missing_network_data {
        tracing::warn!("No network-requests data found in {}", filename);
    }

    let mut metrics = RunMetrics::zeroed(Iteration::Run(run_number), filename.to_string());

    let score = report.pointer(PERFORMANCE_SCORE).and_then(Value::as_f64).unwrap_or(0.0);
    metrics.performance_score = (score * 100.0).round();

    metrics.lcp_ms = audit_value(report, "largest-contentful-paint");
    metrics.fcp_ms = audit_value(report, "first-contentful-paint");
    metrics.ttfb_ms = audit_value(report, "server-response-time");
    metrics.tbt_ms = audit_value(report, "total-blocking-time");
    metrics.cls = audit_value(report, "cumulative-layout-shift");
    metrics.tti_ms = audit_value(report, "interactive");
    metrics.main_thread_ms = audit_value(report, "mainthread-work-breakdown");

    let long_tasks = report
        .pointer(LONG_TASK_ITEMS)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    metrics.long_tasks_count = long_tasks.len() as f64;
    metrics.largest_long_task_ms = long_tasks
        .iter()
        .filter_map(|t| t.get("duration").and_then(Value::as_f64))
        .fold(0.0, f64::max);

    let total_bytes: u64 = entries.iter().map(|e| e.transfer_bytes).sum();
    let js_bytes: u64 = entries
        .iter()
        .filter(|e| e.resource_type == ResourceType::Script)
        .map(|e| e.transfer_bytes)
        .sum();

    // Unparseable URLs count towards totals but towards neither party.
    let third_party: Vec<&NetworkEntry> = entries
        .iter()
        .filter(|e| matches!(matcher.classify_url(&e.url), Ok(c) if c.party == Party::Third))
        .collect();

    metrics.requests = entries.len() as f64;
    metrics.total_bytes = total_bytes as f64;
    metrics.total_kb = bytes_to_kb(total_bytes as f64);
    metrics.js_bytes = js_bytes as f64;
    metrics.third_party_requests = third_party.len() as f64;
    metrics.third_party_bytes = third_party.iter().map(|e| e.transfer_bytes).sum::<u64>() as f64;
    metrics.co2_grams = estimator.grams(total_bytes);

    tracing::debug!(
        "Parsed run {} from {}: {} requests, {} bytes, score {}",
        run_number,
        filename,
        entries.len(),
        total_bytes,
        metrics.performance_score
    );

    ParsedRun {
        metrics,
        entries,
        missing_network_data,
    }
}

/// Network entries listed in the report, one per distinct URL in order of
/// first appearance.
///
/// A URL listed more than once is collapsed into its first entry with the
/// byte counts of every listing summed.
pub fn network_entries(report: &Value) -> Vec<NetworkEntry> {
    let items = report
        .pointer(NETWORK_ITEMS)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut entries: Vec<NetworkEntry> = Vec::with_capacity(items.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in items.iter().filter_map(parse_item) {
        match positions.get(&entry.url) {
            Some(&index) => {
                tracing::debug!("Merging repeated network entry for {}", entry.url);
                let existing = &mut entries[index];
                existing.transfer_bytes += entry.transfer_bytes;
                existing.resource_bytes += entry.resource_bytes;
            }
            None => {
                positions.insert(entry.url.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    entries
}

fn parse_item(item: &Value) -> Option<NetworkEntry> {
    let url = item.get("url").and_then(Value::as_str)?;

    Some(NetworkEntry {
        url: url.to_string(),
        resource_type: item
            .get("resourceType")
            .and_then(Value::as_str)
            .map(ResourceType::from)
            .unwrap_or(ResourceType::Other),
        mime_type: string_field(item, "mimeType"),
        transfer_bytes: byte_field(item, "transferSize"),
        resource_bytes: byte_field(item, "resourceSize"),
        status_code: item
            .get("statusCode")
            .and_then(Value::as_f64)
            .filter(|s| *s >= 0.0 && *s <= u16::MAX as f64)
            .map(|s| s as u16)
            .unwrap_or(0),
        initiator: string_field(item, "initiatorType"),
        cache_control: String::new(),
    })
}

fn audit_value(report: &Value, audit: &str) -> f64 {
    report
        .get("audits")
        .and_then(|a| a.get(audit))
        .and_then(|a| a.get("numericValue"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn string_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn byte_field(item: &Value, key: &str) -> u64 {
    item.get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0).round() as u64)))
        .unwrap_or(0)
}
