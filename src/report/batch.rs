//! Batch runner
//!
//! Processes every configured site concurrently. Each site runs in its own
//! task; a failing site is recorded and the others carry on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;

use super::site::{build_site_report, ReportSettings};
use crate::config::Config;
use crate::export::{write_batch_summary, write_site_report, write_site_sheets};
use crate::hosting::HostingLookup;
use crate::metrics::classify::site_domain;
use crate::models::HostingFacts;
use crate::parser::load_site_inputs;
use crate::PipelineError;

/// What happened to one site
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteOutcome {
    Succeeded {
        site: String,
        report_path: PathBuf,
        data_quality_issues: usize,
    },
    Failed {
        site: String,
        error: PipelineError,
    },
}

impl SiteOutcome {
    pub fn site(&self) -> &str {
        match self {
            SiteOutcome::Succeeded { site, .. } | SiteOutcome::Failed { site, .. } => site,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SiteOutcome::Failed { .. })
    }
}

/// Outcome of a whole batch, in configured site order
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub started_at: String,
    pub finished_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<SiteOutcome>,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failed_sites(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(SiteOutcome::site)
    }
}

/// Load, build and write one site. Blocking.
fn process_site(
    raw_dir: &Path,
    processed: &Path,
    site: &str,
    hosting: HostingFacts,
    settings: &ReportSettings,
) -> Result<(PathBuf, usize), PipelineError> {
    let inputs = load_site_inputs(raw_dir, site)?;
    let report = build_site_report(&inputs, hosting, settings)?;

    write_site_sheets(&report, processed)?;
    let path = write_site_report(&report, processed)?;

    Ok((path, report.data_quality.len()))
}

async fn run_site<L: HostingLookup>(
    site: String,
    lookup: Arc<L>,
    semaphore: Arc<Semaphore>,
    settings: Arc<ReportSettings>,
    raw_dir: PathBuf,
    processed: PathBuf,
) -> Result<(PathBuf, usize), PipelineError> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| PipelineError::Join(e.to_string()))?;

    tracing::info!("Processing {}", site);
    let hosting = lookup.lookup(&site_domain(&site)).await;

    tokio::task::spawn_blocking(move || process_site(&raw_dir, &processed, &site, hosting, &settings))
        .await
        .map_err(|e| PipelineError::Join(e.to_string()))?
}

/// Process every configured site and write `batch-summary.json`
pub async fn process_sites<L: HostingLookup + 'static>(config: &Config, lookup: Arc<L>) -> BatchSummary {
    let start = Instant::now();
    let started_at = chrono::Utc::now().to_rfc3339();

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let settings = Arc::new(config.report_settings());
    let raw_dir = config.raw_dir();
    let processed = config.processed_dir();

    let handles = config.sites.iter().map(|site| {
        tokio::spawn(run_site(
            site.clone(),
            lookup.clone(),
            semaphore.clone(),
            settings.clone(),
            raw_dir.clone(),
            processed.clone(),
        ))
    });
    let results = join_all(handles).await;

    let mut outcomes = Vec::with_capacity(results.len());
    for (site, joined) in config.sites.iter().cloned().zip(results) {
        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(PipelineError::Join(e.to_string())),
        };

        let outcome = match result {
            Ok((report_path, data_quality_issues)) => {
                tracing::info!("Finished {} -> {:?}", site, report_path);
                SiteOutcome::Succeeded {
                    site,
                    report_path,
                    data_quality_issues,
                }
            }
            Err(error) => {
                tracing::error!("Failed to process {}: {}", site, error);
                SiteOutcome::Failed { site, error }
            }
        };
        outcomes.push(outcome);
    }

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    let summary = BatchSummary {
        started_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
        succeeded: outcomes.len() - failed,
        failed,
        outcomes,
    };

    tracing::info!(
        "Processed {} sites ({} failed) in {:?}",
        summary.outcomes.len(),
        summary.failed,
        start.elapsed()
    );

    if let Err(e) = write_batch_summary(&summary, &processed) {
        tracing::error!("Failed to write batch summary: {}", e);
    }

    summary
}
