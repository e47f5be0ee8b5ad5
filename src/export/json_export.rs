//! JSON export functionality
//!
//! Full site reports (re-read later by the comparator), the comparison
//! table with an export envelope, and the batch summary.

use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{batch_summary_path, comparison_json_path, report_json_path};
use crate::models::{ComparisonRow, SiteReport};
use crate::report::batch::BatchSummary;
use crate::PipelineError;

const EXPORT_VERSION: &str = "1.0.0";

/// Comparison export structure for JSON
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonExportJson<'a> {
    pub export_date: String,
    pub export_version: &'static str,
    pub total_sites: usize,
    pub sites: &'a [ComparisonRow],
}

/// Serialize a value as pretty JSON into `path`
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Export(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| PipelineError::Export(format!("Failed to create JSON file {:?}: {}", path, e)))?;

    file.write_all(json.as_bytes())
        .map_err(|e| PipelineError::Export(format!("Failed to write JSON file {:?}: {}", path, e)))?;

    Ok(())
}

/// Write a site report to `<processed>/<site>-report.json`
pub fn write_site_report(report: &SiteReport, processed: &Path) -> Result<PathBuf, PipelineError> {
    std::fs::create_dir_all(processed)?;
    let path = report_json_path(processed, &report.site);
    write_json(report, &path)?;
    Ok(path)
}

/// Read a site report written by `write_site_report`
pub fn read_site_report(path: &Path) -> Result<SiteReport, PipelineError> {
    let file = std::fs::File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| PipelineError::Export(format!("Invalid site report {:?}: {}", path, e)))
}

/// Write the comparison table to `<processed>/ALL-SITES-COMPARISON.json`
pub fn write_comparison_json(rows: &[ComparisonRow], processed: &Path) -> Result<PathBuf, PipelineError> {
    let export = ComparisonExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        total_sites: rows.len(),
        sites: rows,
    };

    let path = comparison_json_path(processed);
    write_json(&export, &path)?;
    Ok(path)
}

/// Write the outcome of a batch to `<processed>/batch-summary.json`
pub fn write_batch_summary(summary: &BatchSummary, processed: &Path) -> Result<PathBuf, PipelineError> {
    std::fs::create_dir_all(processed)?;
    let path = batch_summary_path(processed);
    write_json(summary, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::carbon::CarbonModel;
    use crate::models::{HostingFacts, Iteration, RunMetrics};
    use std::fs;

    fn sample_report() -> SiteReport {
        let mut run = RunMetrics::zeroed(Iteration::Run(1), "t-lhr-1.json".to_string());
        run.total_bytes = 2048.0;
        let mut average = RunMetrics::zeroed(Iteration::Average, "average (median)".to_string());
        average.total_bytes = 2048.0;

        SiteReport {
            site: "sande.kommune.no".to_string(),
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            carbon_model: CarbonModel::SustainableWebDesign,
            runs: vec![run, average],
            representative_run: 1,
            resources: vec![],
            summary_by_type: vec![],
            representative_summary_by_type: vec![],
            co2: vec![],
            hosting: HostingFacts::unknown("sande.kommune.no"),
            cache_summary: vec![],
            data_quality: vec![],
        }
    }

    #[test]
    fn test_site_report_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path().join("processed");

        let path = write_site_report(&sample_report(), &processed).unwrap();
        assert!(path.ends_with("sande.kommune.no-report.json"));

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["carbon_model"], "swd");
        assert_eq!(raw["runs"][1]["iteration"], "average");

        let read = read_site_report(&path).unwrap();
        assert_eq!(read.site, "sande.kommune.no");
        assert_eq!(read.runs.len(), 2);
        assert_eq!(read.average().unwrap().total_bytes, 2048.0);
    }

    #[test]
    fn test_read_invalid_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken-report.json");
        fs::write(&path, "{\"site\": 1}").unwrap();
        assert!(matches!(read_site_report(&path), Err(PipelineError::Export(_))));
    }

    #[test]
    fn test_comparison_json_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_comparison_json(&[], dir.path()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["export_version"], "1.0.0");
        assert!(parsed["export_date"].is_string());
        assert_eq!(parsed["total_sites"], 0);
        assert!(parsed["sites"].as_array().unwrap().is_empty());
    }
}
