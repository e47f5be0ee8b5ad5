//! Cross-site comparison row

use serde::{Deserialize, Serialize};

/// One site's summary line in the cross-site comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub site: String,
    pub performance: f64,
    pub requests: f64,
    pub total_kb: f64,
    pub kb_per_request: f64,
    pub co2_g: f64,
    pub co2_per_kb: f64,
    pub images_kb: f64,
    pub image_pct: f64,
    pub scripts_kb: f64,
    /// Transfer bytes over uncompressed resource bytes
    pub compression_ratio: f64,
    pub third_party_pct: f64,
    pub lcp_ms: f64,
    pub fcp_ms: f64,
    pub ttfb_ms: f64,
    pub tbt_ms: f64,
    pub cls: f64,
}
