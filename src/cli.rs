use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::metrics::carbon::CarbonModel;

#[derive(Debug, Parser)]
#[command(author, version, about = "Web performance and carbon footprint reports", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = "WEBFOOTPRINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory holding raw/ and processed/
    #[arg(long, global = true, env = "WEBFOOTPRINT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build site reports from captured runs
    Process(ProcessArgs),
    /// Build the cross-site comparison from processed reports
    Compare,
    /// Process sites, then compare them
    All(ProcessArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ProcessArgs {
    /// Site to process (repeatable); defaults to the configured list
    #[arg(long = "site")]
    pub sites: Vec<String>,

    /// Carbon model: one-byte or swd
    #[arg(long)]
    pub model: Option<CarbonModel>,

    /// Maximum number of sites processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip green hosting and carbon.txt lookups
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::WARN;
        }
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Command-line values that override the config file
    pub fn overrides(&self) -> ConfigOverrides {
        let process = match &self.command {
            Commands::Process(args) | Commands::All(args) => args.clone(),
            Commands::Compare => ProcessArgs::default(),
        };

        ConfigOverrides {
            data_dir: self.data_dir.clone(),
            sites: process.sites,
            carbon_model: process.model,
            concurrency: process.concurrency,
            offline: process.offline,
        }
    }
}
