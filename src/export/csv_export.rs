//! CSV export functionality
//!
//! Writes each sheet of a site report, and the comparison table, as CSV.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;

use super::{
    comparison_csv_path, site_sheet_dir, CACHE_SUMMARY_SHEET, CO2_SHEET, HOSTING_SHEET,
    MEDIAN_SUMMARY_BY_TYPE_SHEET, PER_RESOURCE_SHEET, RUNS_SHEET, SUMMARY_BY_TYPE_SHEET,
};
use crate::metrics::ratios::round_to;
use crate::models::{ComparisonRow, ReconciledResource, SiteReport};
use crate::PipelineError;

fn create_writer(path: &Path) -> Result<Writer<File>, PipelineError> {
    let file = File::create(path)
        .map_err(|e| PipelineError::Export(format!("Failed to create CSV file {:?}: {}", path, e)))?;
    Ok(Writer::from_writer(file))
}

fn finish(mut writer: Writer<File>) -> Result<(), PipelineError> {
    writer
        .flush()
        .map_err(|e| PipelineError::Export(format!("Failed to flush CSV: {}", e)))
}

/// Write a slice of serializable records, one row each, with a header row
pub fn write_records<T: Serialize>(records: &[T], path: &Path) -> Result<(), PipelineError> {
    let mut writer = create_writer(path)?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| PipelineError::Export(format!("Failed to write CSV record: {}", e)))?;
    }

    finish(writer)
}

/// Column suffixes repeated once per run in the per-resource sheet
const PER_RUN_COLUMNS: [&str; 8] = [
    "resource_type",
    "mime_type",
    "transfer_bytes",
    "resource_bytes",
    "co2_g_transfer",
    "cache_control",
    "status_code",
    "initiator",
];

/// Write the per-URL sheet with one column group per run.
///
/// `run_labels` name the run slots in order; a URL absent from a run
/// leaves that run's columns empty.
pub fn write_per_resource_csv(
    resources: &[ReconciledResource],
    run_labels: &[u32],
    path: &Path,
) -> Result<(), PipelineError> {
    let mut writer = create_writer(path)?;
    let write_err = |e: csv::Error| PipelineError::Export(format!("Failed to write CSV record: {}", e));

    let mut header = vec!["url".to_string(), "origin".to_string(), "party".to_string()];
    for run in run_labels {
        header.extend(PER_RUN_COLUMNS.iter().map(|c| format!("{}_run{}", c, run)));
    }
    writer.write_record(&header).map_err(write_err)?;

    for resource in resources {
        let mut row = vec![
            resource.url.clone(),
            resource.origin.clone().unwrap_or_default(),
            resource.party.map(|p| p.to_string()).unwrap_or_default(),
        ];

        for slot in 0..run_labels.len() {
            match resource.runs.get(slot).and_then(Option::as_ref) {
                Some(obs) => row.extend([
                    obs.entry.resource_type.to_string(),
                    obs.entry.mime_type.clone(),
                    obs.entry.transfer_bytes.to_string(),
                    obs.entry.resource_bytes.to_string(),
                    round_to(obs.co2_grams, 6).to_string(),
                    obs.entry.cache_control.clone(),
                    obs.entry.status_code.to_string(),
                    obs.entry.initiator.clone(),
                ]),
                None => row.extend(std::iter::repeat(String::new()).take(PER_RUN_COLUMNS.len())),
            }
        }

        writer.write_record(&row).map_err(write_err)?;
    }

    finish(writer)
}

/// Write every sheet of a site report as `<processed>/<site>/<sheet>.csv`
pub fn write_site_sheets(report: &SiteReport, processed: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let dir = site_sheet_dir(processed, &report.site);
    std::fs::create_dir_all(&dir)?;

    let sheet = |name: &str| dir.join(format!("{}.csv", name));
    let run_labels: Vec<u32> = report
        .raw_runs()
        .filter_map(|r| r.iteration.run_number())
        .collect();

    write_records(&report.runs, &sheet(RUNS_SHEET))?;
    write_per_resource_csv(&report.resources, &run_labels, &sheet(PER_RESOURCE_SHEET))?;
    write_records(&report.summary_by_type, &sheet(SUMMARY_BY_TYPE_SHEET))?;
    write_records(
        &report.representative_summary_by_type,
        &sheet(MEDIAN_SUMMARY_BY_TYPE_SHEET),
    )?;
    write_records(&report.co2, &sheet(CO2_SHEET))?;
    write_records(&report.hosting.to_rows(), &sheet(HOSTING_SHEET))?;
    write_records(&report.cache_summary, &sheet(CACHE_SUMMARY_SHEET))?;

    let written: Vec<PathBuf> = super::SHEETS.iter().map(|name| sheet(name)).collect();
    tracing::debug!("Wrote {} sheets to {:?}", written.len(), dir);
    Ok(written)
}

/// Write the comparison table to `<processed>/ALL-SITES-COMPARISON.csv`
pub fn write_comparison_csv(rows: &[ComparisonRow], processed: &Path) -> Result<PathBuf, PipelineError> {
    let path = comparison_csv_path(processed);
    write_records(rows, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkEntry, Party, ResourceType, RunObservation};
    use std::fs;

    fn observation(transfer: u64) -> Option<RunObservation> {
        Some(RunObservation {
            entry: NetworkEntry {
                url: "https://a.no/app.js".to_string(),
                resource_type: ResourceType::Script,
                mime_type: "text/javascript".to_string(),
                transfer_bytes: transfer,
                resource_bytes: transfer * 3,
                status_code: 200,
                initiator: "parser".to_string(),
                cache_control: "max-age=60".to_string(),
            },
            co2_grams: 0.5,
        })
    }

    #[test]
    fn test_write_per_resource_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("per_resource.csv");

        let resources = vec![ReconciledResource {
            url: "https://a.no/app.js".to_string(),
            origin: Some("https://a.no".to_string()),
            party: Some(Party::First),
            runs: vec![observation(100), None, observation(120)],
        }];

        write_per_resource_csv(&resources, &[1, 2, 3], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("url,origin,party,resource_type_run1,"));
        assert!(header.contains("initiator_run3"));
        assert_eq!(header.split(',').count(), 3 + 3 * PER_RUN_COLUMNS.len());

        let row = lines.next().unwrap();
        assert!(row.starts_with("https://a.no/app.js,https://a.no,first,Script,text/javascript,100,300,"));
        // Run 2 is empty
        assert!(row.contains(",,,,,,,,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_records_header_and_rows() {
        #[derive(Serialize)]
        struct Row {
            domain: String,
            total_requests: u64,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![
            Row { domain: "a.no".to_string(), total_requests: 3 },
            Row { domain: "b.no".to_string(), total_requests: 1 },
        ];

        write_records(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "domain,total_requests\na.no,3\nb.no,1\n");
    }

    #[test]
    fn test_write_records_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.csv");
        let rows: Vec<ComparisonRow> = vec![];
        assert!(matches!(write_records(&rows, &path), Err(PipelineError::Export(_))));
    }
}
