//! Site report types
//!
//! Everything that ends up in the per-site multi-sheet report

use serde::{Deserialize, Serialize};

use super::metrics::{Iteration, RunMetrics};
use super::resource::{ReconciledResource, ResourceType};
use crate::metrics::carbon::CarbonModel;

/// Bytes, request count and carbon estimate for one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub resource_type: ResourceType,
    pub requests: u64,
    pub transfer_bytes: u64,
    pub resource_bytes: u64,
    pub transfer_kb: f64,
    pub resource_kb: f64,
    /// Share of the mode's total transfer bytes (0-100, 1 decimal)
    pub transfer_pct: f64,
    pub co2_grams: f64,
}

/// Request counts for one hostname, deduplicated by URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub domain: String,
    pub total_requests: u64,
    pub first_party: u64,
    pub third_party: u64,
    pub pct_first_party: f64,
    pub pct_third_party: f64,
}

impl CacheSummary {
    /// Domain label of the synthetic totals row
    pub const TOTAL_LABEL: &'static str = "TOTAL (all unique requests)";

    pub fn is_total(&self) -> bool {
        self.domain == Self::TOTAL_LABEL
    }
}

/// Carbon estimate for one run under both supported models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Co2Row {
    pub iteration: Iteration,
    pub total_bytes: f64,
    pub co2_g_one_byte: f64,
    pub co2_g_swd: f64,
}

/// Hosting facts for a site's domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostingFacts {
    pub domain: String,
    pub green_hosted: bool,
    pub carbon_txt_found: bool,
    /// RFC 3339 timestamp of the lookup
    pub checked_at: String,
}

impl HostingFacts {
    /// Facts for a domain that was not (or could not be) checked
    pub fn unknown(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            green_hosted: false,
            carbon_txt_found: false,
            checked_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Property/value rows for the hosting sheet
    pub fn to_rows(&self) -> Vec<PropertyRow> {
        let yes_no = |b: bool| if b { "Yes" } else { "No" }.to_string();
        vec![
            PropertyRow::new("domain", self.domain.clone()),
            PropertyRow::new("green_hosted", yes_no(self.green_hosted)),
            PropertyRow::new("carbon_txt_found", yes_no(self.carbon_txt_found)),
            PropertyRow::new("date_processed", self.checked_at.clone()),
        ]
    }
}

/// Generic two-column row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub property: String,
    pub value: String,
}

impl PropertyRow {
    pub fn new(property: &str, value: String) -> Self {
        Self {
            property: property.to_string(),
            value,
        }
    }
}

/// Recoverable data problems found while building a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// The trace had no network-requests detail; the run is zero-valued
    MissingTraceData { run: u32 },
    /// No network-activity log was found for the run
    MissingNetworkLog { run: u32 },
    /// A request URL could not be classified by party
    MalformedUrl { url: String, reason: String },
    /// A response-header event could not be tied to a request URL
    UnresolvableHeaderEvent { run: u32, key: String },
}

/// Complete report for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    pub site: String,
    pub generated_at: String,
    pub carbon_model: CarbonModel,
    /// Raw runs in capture order followed by the synthetic average
    pub runs: Vec<RunMetrics>,
    /// Run number whose total transfer bytes is closest to the average
    pub representative_run: u32,
    pub resources: Vec<ReconciledResource>,
    pub summary_by_type: Vec<TypeSummary>,
    pub representative_summary_by_type: Vec<TypeSummary>,
    pub co2: Vec<Co2Row>,
    pub hosting: HostingFacts,
    pub cache_summary: Vec<CacheSummary>,
    #[serde(default)]
    pub data_quality: Vec<DataQualityIssue>,
}

impl SiteReport {
    /// The synthetic median record
    pub fn average(&self) -> Option<&RunMetrics> {
        self.runs.iter().find(|r| r.is_average())
    }

    /// Captured runs, excluding the synthetic average
    pub fn raw_runs(&self) -> impl Iterator<Item = &RunMetrics> {
        self.runs.iter().filter(|r| !r.is_average())
    }

    /// The TOTAL row of the cache summary
    pub fn cache_total(&self) -> Option<&CacheSummary> {
        self.cache_summary.iter().find(|c| c.is_total())
    }

    /// Representative-mode summary row for a resource type
    pub fn representative_type(&self, resource_type: ResourceType) -> Option<&TypeSummary> {
        self.representative_summary_by_type
            .iter()
            .find(|t| t.resource_type == resource_type)
    }
}
