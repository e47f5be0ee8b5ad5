//! Metrics calculation module
//!
//! This module handles computing per-site figures:
//! - Carbon estimation (one-byte and Sustainable Web Design models)
//! - Median aggregation and representative-run selection
//! - Cross-run URL reconciliation
//! - First/third-party classification and cache summary
//! - Resource-type aggregation

pub mod carbon;
pub mod classify;
pub mod median;
pub mod ratios;
pub mod reconcile;
pub mod types;
