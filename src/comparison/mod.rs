//! Cross-site comparison
//!
//! Re-reads the per-site JSON reports and reduces each to one
//! `ComparisonRow`, ranked by performance score.

use std::path::{Path, PathBuf};

use crate::export::{read_site_report, report_glob, write_comparison_csv, write_comparison_json};
use crate::metrics::ratios::{percentage, round_to, safe_ratio, BYTES_PER_KB};
use crate::metrics::types::{total_resource_bytes, total_transfer_bytes};
use crate::models::{ComparisonRow, Iteration, ResourceType, RunMetrics, SiteReport, AVERAGE_LABEL};
use crate::PipelineError;

impl ComparisonRow {
    /// Summarise one site report.
    ///
    /// Run-level figures come from the median record. Image and script
    /// figures describe the representative run, so the image share uses that
    /// run's total. Compression uses the aggregate type sums and the
    /// third-party share comes from the cache summary TOTAL row.
    pub fn from_report(report: &SiteReport) -> Self {
        let fallback;
        let average = match report.average() {
            Some(a) => a,
            None => {
                tracing::warn!("{} has no median record; using zeros", report.site);
                fallback = RunMetrics::zeroed(Iteration::Average, AVERAGE_LABEL.to_string());
                &fallback
            }
        };

        let representative_total = total_transfer_bytes(&report.representative_summary_by_type);
        let (image_bytes, images_kb) = report
            .representative_type(ResourceType::Image)
            .map(|t| (t.transfer_bytes, t.transfer_kb))
            .unwrap_or((0, 0.0));
        let scripts_kb = report
            .representative_type(ResourceType::Script)
            .map(|t| t.transfer_kb)
            .unwrap_or(0.0);

        let aggregate_transfer = total_transfer_bytes(&report.summary_by_type);
        let aggregate_resource = total_resource_bytes(&report.summary_by_type);

        Self {
            site: report.site.clone(),
            performance: average.performance_score,
            requests: average.requests,
            total_kb: average.total_kb,
            kb_per_request: round_to(
                safe_ratio(average.total_bytes, average.requests) / BYTES_PER_KB,
                1,
            ),
            co2_g: round_to(average.co2_grams, 4),
            co2_per_kb: round_to(safe_ratio(average.co2_grams, average.total_kb), 4),
            images_kb,
            image_pct: round_to(
                percentage(image_bytes as f64, representative_total as f64),
                1,
            ),
            scripts_kb,
            compression_ratio: round_to(
                safe_ratio(aggregate_transfer as f64, aggregate_resource as f64),
                2,
            ),
            third_party_pct: report.cache_total().map(|t| t.pct_third_party).unwrap_or(0.0),
            lcp_ms: average.lcp_ms,
            fcp_ms: average.fcp_ms,
            ttfb_ms: average.ttfb_ms,
            tbt_ms: average.tbt_ms,
            cls: average.cls,
        }
    }
}

/// One row per report, sorted by performance score descending.
/// Sites with equal scores keep their input order.
pub fn compare_reports(reports: &[SiteReport]) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = reports.iter().map(ComparisonRow::from_report).collect();
    rows.sort_by(|a, b| b.performance.total_cmp(&a.performance));
    rows
}

/// Load every `*-report.json` in `processed`, in file-name order.
/// Unreadable reports are logged and skipped.
pub fn load_reports(processed: &Path) -> Result<Vec<SiteReport>, PipelineError> {
    let pattern = report_glob(processed);
    let paths = glob::glob(&pattern).map_err(|e| PipelineError::Config(e.to_string()))?;

    let mut files: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    files.sort();

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        match read_site_report(&path) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!("Skipping report {:?}: {}", path, e),
        }
    }

    Ok(reports)
}

/// Result of a comparison run
#[derive(Debug, Clone)]
pub struct ComparisonOutput {
    pub rows: Vec<ComparisonRow>,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

/// Build the comparison from the reports in `processed` and write it as CSV and JSON
pub fn build_comparison(processed: &Path) -> Result<ComparisonOutput, PipelineError> {
    let reports = load_reports(processed)?;
    if reports.is_empty() {
        tracing::warn!("No site reports found in {:?}", processed);
    }

    let rows = compare_reports(&reports);
    std::fs::create_dir_all(processed)?;
    let csv_path = write_comparison_csv(&rows, processed)?;
    let json_path = write_comparison_json(&rows, processed)?;

    tracing::info!("Compared {} sites: {:?}", rows.len(), csv_path);

    Ok(ComparisonOutput {
        rows,
        csv_path,
        json_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_site_report;
    use crate::metrics::carbon::CarbonModel;
    use crate::models::{CacheSummary, HostingFacts, TypeSummary};

    fn type_summary(resource_type: ResourceType, transfer: u64, resource: u64) -> TypeSummary {
        TypeSummary {
            resource_type,
            requests: 1,
            transfer_bytes: transfer,
            resource_bytes: resource,
            transfer_kb: round_to(transfer as f64 / 1024.0, 1),
            resource_kb: round_to(resource as f64 / 1024.0, 1),
            transfer_pct: 0.0,
            co2_grams: 0.0,
        }
    }

    fn report(site: &str, score: f64) -> SiteReport {
        let mut average = RunMetrics::zeroed(Iteration::Average, AVERAGE_LABEL.to_string());
        average.performance_score = score;
        average.requests = 10.0;
        average.total_bytes = 20480.0;
        average.total_kb = 20.0;
        average.co2_grams = 0.01;
        average.lcp_ms = 1500.0;

        SiteReport {
            site: site.to_string(),
            generated_at: String::new(),
            carbon_model: CarbonModel::OneByte,
            runs: vec![average],
            representative_run: 1,
            resources: vec![],
            summary_by_type: vec![
                type_summary(ResourceType::Script, 6000, 18000),
                type_summary(ResourceType::Image, 4000, 4000),
            ],
            representative_summary_by_type: vec![
                type_summary(ResourceType::Script, 3072, 9000),
                type_summary(ResourceType::Image, 1024, 1024),
            ],
            co2: vec![],
            hosting: HostingFacts::unknown(site),
            cache_summary: vec![CacheSummary {
                domain: CacheSummary::TOTAL_LABEL.to_string(),
                total_requests: 10,
                first_party: 7,
                third_party: 3,
                pct_first_party: 70.0,
                pct_third_party: 30.0,
            }],
            data_quality: vec![],
        }
    }

    #[test]
    fn test_row_ratios() {
        let row = ComparisonRow::from_report(&report("a.no", 90.0));

        assert_eq!(row.performance, 90.0);
        assert_eq!(row.kb_per_request, 2.0);
        assert_eq!(row.co2_per_kb, 0.0005);
        assert_eq!(row.images_kb, 1.0);
        assert_eq!(row.image_pct, 25.0);
        assert_eq!(row.scripts_kb, 3.0);
        // 10000 / 22000
        assert_eq!(row.compression_ratio, 0.45);
        assert_eq!(row.third_party_pct, 30.0);
        assert_eq!(row.lcp_ms, 1500.0);
    }

    #[test]
    fn test_zero_denominators_give_zero() {
        let mut empty = report("empty.no", 0.0);
        empty.runs = vec![RunMetrics::zeroed(Iteration::Average, AVERAGE_LABEL.to_string())];
        empty.summary_by_type.clear();
        empty.representative_summary_by_type.clear();
        empty.cache_summary.clear();

        let row = ComparisonRow::from_report(&empty);
        assert_eq!(row.kb_per_request, 0.0);
        assert_eq!(row.co2_per_kb, 0.0);
        assert_eq!(row.image_pct, 0.0);
        assert_eq!(row.compression_ratio, 0.0);
        assert_eq!(row.third_party_pct, 0.0);
        assert!(row.kb_per_request.is_finite());
    }

    #[test]
    fn test_missing_average_uses_zeros() {
        let mut no_average = report("b.no", 50.0);
        no_average.runs.clear();
        let row = ComparisonRow::from_report(&no_average);
        assert_eq!(row.performance, 0.0);
        assert_eq!(row.requests, 0.0);
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let reports = vec![
            report("first-70.no", 70.0),
            report("top.no", 95.0),
            report("second-70.no", 70.0),
            report("low.no", 40.0),
        ];

        let sites: Vec<String> = compare_reports(&reports).into_iter().map(|r| r.site).collect();
        assert_eq!(sites, vec!["top.no", "first-70.no", "second-70.no", "low.no"]);
    }

    #[test]
    fn test_build_comparison_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let processed = dir.path();

        write_site_report(&report("a.no", 60.0), processed).unwrap();
        write_site_report(&report("b.no", 80.0), processed).unwrap();
        std::fs::write(processed.join("broken.no-report.json"), "not json").unwrap();

        let output = build_comparison(processed).unwrap();
        assert_eq!(output.rows.len(), 2);
        assert_eq!(output.rows[0].site, "b.no");
        assert!(output.csv_path.exists());
        assert!(output.json_path.exists());

        let csv = std::fs::read_to_string(&output.csv_path).unwrap();
        assert!(csv.starts_with("site,performance,requests,total_kb,kb_per_request,"));
        assert_eq!(csv.lines().count(), 3);
    }
}
