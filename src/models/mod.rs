//! Data models module
//!
//! Contains all data structures used throughout the pipeline:
//! - Run-level metrics and the metric field list
//! - Network entries and reconciled per-URL resources
//! - Site report tables
//! - Cross-site comparison rows

pub mod comparison;
pub mod metrics;
pub mod report;
pub mod resource;

pub use comparison::ComparisonRow;
pub use metrics::{Iteration, MetricField, RunMetrics, AVERAGE_LABEL};
pub use report::{
    CacheSummary, Co2Row, DataQualityIssue, HostingFacts, PropertyRow, SiteReport, TypeSummary,
};
pub use resource::{NetworkEntry, Party, ReconciledResource, ResourceType, RunObservation};
