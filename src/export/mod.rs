//! Export module for CSV and JSON output
//!
//! Every per-site sheet is written as its own CSV file under
//! `processed/<site>/`, and the full report as `processed/<site>-report.json`.
//! The cross-site comparison goes to `processed/ALL-SITES-COMPARISON.{csv,json}`.

pub mod csv_export;
pub mod json_export;

use std::path::{Path, PathBuf};

use crate::metrics::classify::site_domain;

/// Sheet names of the per-site report, in output order
pub const RUNS_SHEET: &str = "runs";
pub const PER_RESOURCE_SHEET: &str = "per_resource_all_runs";
pub const SUMMARY_BY_TYPE_SHEET: &str = "summary_by_type";
pub const MEDIAN_SUMMARY_BY_TYPE_SHEET: &str = "median_summary_by_type";
pub const CO2_SHEET: &str = "co2";
pub const HOSTING_SHEET: &str = "hosting_info";
pub const CACHE_SUMMARY_SHEET: &str = "cache_summary";

pub const SHEETS: [&str; 7] = [
    RUNS_SHEET,
    PER_RESOURCE_SHEET,
    SUMMARY_BY_TYPE_SHEET,
    MEDIAN_SUMMARY_BY_TYPE_SHEET,
    CO2_SHEET,
    HOSTING_SHEET,
    CACHE_SUMMARY_SHEET,
];

const REPORT_SUFFIX: &str = "-report.json";
const COMPARISON_STEM: &str = "ALL-SITES-COMPARISON";
const BATCH_SUMMARY_FILE: &str = "batch-summary.json";

/// Captured input root: `<data_dir>/raw`
pub fn raw_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("raw")
}

/// Output root: `<data_dir>/processed`
pub fn processed_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("processed")
}

/// File-system-safe name for a site (its hostname, lowercased)
pub fn site_file_name(site: &str) -> String {
    site_domain(site)
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory holding a site's sheet CSV files
pub fn site_sheet_dir(processed: &Path, site: &str) -> PathBuf {
    processed.join(site_file_name(site))
}

pub fn report_json_path(processed: &Path, site: &str) -> PathBuf {
    processed.join(format!("{}{}", site_file_name(site), REPORT_SUFFIX))
}

/// Glob pattern matching every per-site JSON report in `processed`
pub fn report_glob(processed: &Path) -> String {
    let dir = processed.to_string_lossy();
    format!("{}/*{}", glob::Pattern::escape(&dir), REPORT_SUFFIX)
}

pub fn comparison_csv_path(processed: &Path) -> PathBuf {
    processed.join(format!("{}.csv", COMPARISON_STEM))
}

pub fn comparison_json_path(processed: &Path) -> PathBuf {
    processed.join(format!("{}.json", COMPARISON_STEM))
}

pub fn batch_summary_path(processed: &Path) -> PathBuf {
    processed.join(BATCH_SUMMARY_FILE)
}

pub use csv_export::*;
pub use json_export::*;
