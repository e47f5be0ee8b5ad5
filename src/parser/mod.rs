//! Raw input parsing module
//!
//! This module handles reading one site's captured runs:
//! - Discovering run report files on disk
//! - Performance report parsing (metrics + network entries)
//! - Network-activity log parsing (headers + initiators)

pub mod devtools;
pub mod trace;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Parser errors
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid path: {0:?}")]
    InvalidPath(PathBuf),

    #[error("Invalid file pattern: {0}")]
    Pattern(String),

    #[error("No captured runs found for {0}")]
    NoRuns(String),
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

/// Marker between the file prefix and the run number in report filenames
const RUN_MARKER: &str = "-lhr-";

/// Files belonging to one captured run
#[derive(Debug, Clone, PartialEq)]
pub struct RunFiles {
    pub run_number: u32,
    pub report: PathBuf,
    pub network_log: PathBuf,
}

/// Raw documents for one run
#[derive(Debug, Clone)]
pub struct RunInput {
    pub run_number: u32,
    pub filename: String,
    pub report: Value,
    /// `None` when no network-activity log was captured
    pub network_log: Option<Value>,
}

/// Raw documents for every run of one site
#[derive(Debug, Clone)]
pub struct SiteInputs {
    pub site: String,
    pub runs: Vec<RunInput>,
}

/// Read and parse a JSON document
pub fn read_json(path: &Path) -> ParserResult<Value> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ParserError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Network-activity log path for a report: `x-lhr-1.json` -> `x-lhr-1-0.devtoolslog.json`
pub fn network_log_path(report: &Path) -> PathBuf {
    let stem = report
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    report.with_file_name(format!("{}-0.devtoolslog.json", stem))
}

/// Run number encoded in a report filename, e.g. `site-lhr-2.json` -> 2
fn run_number_of(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once(RUN_MARKER)?;
    number.parse().ok()
}

/// Find the run reports in a site's raw directory, ordered by run number
pub fn discover_run_files(site_dir: &Path) -> ParserResult<Vec<RunFiles>> {
    let dir = site_dir
        .to_str()
        .ok_or_else(|| ParserError::InvalidPath(site_dir.to_path_buf()))?;
    let pattern = format!("{}/*{}*.json", glob::Pattern::escape(dir), RUN_MARKER);

    let paths = glob::glob(&pattern).map_err(|e| ParserError::Pattern(e.to_string()))?;

    let mut runs: Vec<RunFiles> = paths
        .filter_map(Result::ok)
        .filter_map(|report| {
            let run_number = run_number_of(&report)?;
            Some(RunFiles {
                run_number,
                network_log: network_log_path(&report),
                report,
            })
        })
        .collect();

    runs.sort_by_key(|r| r.run_number);
    Ok(runs)
}

/// Load every run of a site from `<raw_dir>/<site>/`.
///
/// A missing or unreadable report fails the site; a missing or unreadable
/// network-activity log only leaves that run without header data.
pub fn load_site_inputs(raw_dir: &Path, site: &str) -> ParserResult<SiteInputs> {
    let site_dir = raw_dir.join(site);
    if !site_dir.is_dir() {
        return Err(ParserError::NoRuns(site.to_string()));
    }

    let files = discover_run_files(&site_dir)?;
    if files.is_empty() {
        return Err(ParserError::NoRuns(site.to_string()));
    }

    let mut runs = Vec::with_capacity(files.len());
    for run_files in files {
        let report = read_json(&run_files.report)?;

        let network_log = if run_files.network_log.exists() {
            match read_json(&run_files.network_log) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!("Unreadable network log {:?}: {}", run_files.network_log, e);
                    None
                }
            }
        } else {
            tracing::warn!("Missing network log: {:?}", run_files.network_log);
            None
        };

        runs.push(RunInput {
            run_number: run_files.run_number,
            filename: run_files.report.to_string_lossy().to_string(),
            report,
            network_log,
        });
    }

    tracing::info!("Loaded {} runs for {}", runs.len(), site);

    Ok(SiteInputs {
        site: site.to_string(),
        runs,
    })
}
