//! Web Footprint
//!
//! Turns captured performance runs of a set of websites into per-site
//! performance and carbon reports, then ranks the sites against each other.
//! It handles:
//! - Performance report and network-activity log parsing
//! - Median aggregation and cross-run URL reconciliation
//! - First/third-party and resource-type classification
//! - Carbon estimation per byte
//! - Per-site CSV/JSON reports and the cross-site comparison

pub mod cli;
pub mod comparison;
pub mod config;
pub mod export;
pub mod hosting;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod report;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use cli::{Cli, Commands};
use config::Config;
use hosting::{HttpHostingLookup, OfflineLookup};
use report::BatchSummary;

/// Error type for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parser error: {0}")]
    Parser(#[from] parser::ParserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Join(String),
}

// Batch summaries carry errors as their display string
impl serde::Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Exit code when at least one site failed
const EXIT_SITE_FAILURES: u8 = 2;

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode, PipelineError> {
    let config = Config::resolve(cli.config.as_deref(), cli.overrides())?;
    tracing::info!("Data directory: {:?}", config.data_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Process(_) => {
            let summary = runtime.block_on(process(&config))?;
            Ok(exit_code(&summary))
        }
        Commands::Compare => {
            comparison::build_comparison(&config.processed_dir())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::All(_) => {
            let summary = runtime.block_on(process(&config))?;
            comparison::build_comparison(&config.processed_dir())?;
            Ok(exit_code(&summary))
        }
    }
}

async fn process(config: &Config) -> Result<BatchSummary, PipelineError> {
    tracing::info!(
        "Processing {} sites with the {} carbon model",
        config.sites.len(),
        config.carbon_model
    );

    let summary = if config.check_hosting {
        let lookup = HttpHostingLookup::new(&config.green_check_endpoint, config.request_timeout_secs)
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;
        report::process_sites(config, Arc::new(lookup)).await
    } else {
        report::process_sites(config, Arc::new(OfflineLookup)).await
    };

    Ok(summary)
}

fn exit_code(summary: &BatchSummary) -> ExitCode {
    if summary.has_failures() {
        let failed: Vec<&str> = summary.failed_sites().collect();
        tracing::warn!("{} site(s) failed: {}", failed.len(), failed.join(", "));
        ExitCode::from(EXIT_SITE_FAILURES)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_as_message() {
        let error = PipelineError::Config("concurrency must be at least 1".to_string());
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!("Configuration error: concurrency must be at least 1")
        );
    }

    #[test]
    fn test_parser_error_converts() {
        let error: PipelineError = parser::ParserError::NoRuns("a.no".to_string()).into();
        assert!(error.to_string().contains("a.no"));
    }
}
