//! Pipeline configuration
//!
//! Loaded in layers: built-in defaults, then an optional JSON file, then
//! command-line overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hosting::DEFAULT_GREEN_CHECK_ENDPOINT;
use crate::metrics::carbon::CarbonModel;
use crate::metrics::classify::site_domain;
use crate::report::site::ReportSettings;
use crate::PipelineError;

/// The 25 municipalities of Møre og Romsdal
pub const DEFAULT_SITES: [&str; 25] = [
    "alesund.kommune.no",
    "aukra.kommune.no",
    "aure.kommune.no",
    "averoy.kommune.no",
    "fjord.kommune.no",
    "giske.kommune.no",
    "gjemnes.kommune.no",
    "hareid.kommune.no",
    "heroy.kommune.no",
    "hustadvika.kommune.no",
    "kristiansund.kommune.no",
    "molde.kommune.no",
    "rauma.kommune.no",
    "sande-mr.kommune.no",
    "smola.kommune.no",
    "stranda.kommune.no",
    "sunndal.kommune.no",
    "sula.kommune.no",
    "sykkylven.kommune.no",
    "tingvoll.kommune.no",
    "ulstein.kommune.no",
    "vanylven.kommune.no",
    "vestnes.kommune.no",
    "volda.kommune.no",
    "orsta.kommune.no",
];

/// County domain shared by the default sites
pub const DEFAULT_PARENT_DOMAINS: [&str; 1] = ["mrfylke.no"];

const APP_DIR: &str = "webfootprint";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site domains to process
    pub sites: Vec<String>,
    /// Root holding `raw/` inputs and `processed/` outputs
    pub data_dir: PathBuf,
    /// Domains counted as first-party for every site
    pub parent_domains: Vec<String>,
    pub carbon_model: CarbonModel,
    /// Maximum number of sites processed at once
    pub concurrency: usize,
    /// Look up green hosting and carbon.txt over the network
    pub check_hosting: bool,
    pub green_check_endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites: DEFAULT_SITES.iter().map(|s| s.to_string()).collect(),
            data_dir: default_data_dir(),
            parent_domains: DEFAULT_PARENT_DOMAINS.iter().map(|s| s.to_string()).collect(),
            carbon_model: CarbonModel::default(),
            concurrency: 4,
            check_hosting: true,
            green_check_endpoint: DEFAULT_GREEN_CHECK_ENDPOINT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Default data directory: `<local data dir>/webfootprint`
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Values given on the command line; `None`/empty leaves the config as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub sites: Vec<String>,
    pub carbon_model: Option<CarbonModel>,
    pub concurrency: Option<usize>,
    pub offline: bool,
}

impl Config {
    /// Load a JSON config file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Invalid config {:?}: {}", path, e)))
    }

    /// Defaults, then the optional file, then the overrides
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, PipelineError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.with_overrides(overrides).validated()
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if !overrides.sites.is_empty() {
            self.sites = overrides.sites;
        }
        if let Some(model) = overrides.carbon_model {
            self.carbon_model = model;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if overrides.offline {
            self.check_hosting = false;
        }
        self
    }

    /// Check limits and reduce every site to its lowercased hostname, which
    /// names its raw and processed directories
    fn validated(mut self) -> Result<Self, PipelineError> {
        if self.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".to_string()));
        }
        if self.sites.iter().any(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config("site names must not be empty".to_string()));
        }

        let mut sites = Vec::with_capacity(self.sites.len());
        for site in &self.sites {
            let host = site_domain(site).to_lowercase();
            if host.is_empty() || host.contains('/') {
                return Err(PipelineError::Config(format!("Invalid site: {}", site)));
            }
            sites.push(host);
        }
        self.sites = sites;

        Ok(self)
    }

    pub fn raw_dir(&self) -> PathBuf {
        crate::export::raw_dir(&self.data_dir)
    }

    pub fn processed_dir(&self) -> PathBuf {
        crate::export::processed_dir(&self.data_dir)
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            carbon_model: self.carbon_model,
            parent_domains: self.parent_domains.clone(),
        }
    }
}
