//! Network request types
//!
//! Per-run request entries and their cross-run reconciliation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource type of a network request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    #[serde(rename = "XHR/Fetch")]
    XhrFetch,
    Other,
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        match s {
            "Document" => ResourceType::Document,
            "Script" => ResourceType::Script,
            "Stylesheet" => ResourceType::Stylesheet,
            "Image" => ResourceType::Image,
            "Font" => ResourceType::Font,
            "XHR" | "Fetch" | "XHR/Fetch" => ResourceType::XhrFetch,
            _ => ResourceType::Other,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceType::Document => "Document",
            ResourceType::Script => "Script",
            ResourceType::Stylesheet => "Stylesheet",
            ResourceType::Image => "Image",
            ResourceType::Font => "Font",
            ResourceType::XhrFetch => "XHR/Fetch",
            ResourceType::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

/// First- or third-party origin of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    First,
    Third,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::First => write!(f, "first"),
            Party::Third => write!(f, "third"),
        }
    }
}

/// One request observed in a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub url: String,
    pub resource_type: ResourceType,
    pub mime_type: String,
    /// Bytes sent over the network (post-compression)
    pub transfer_bytes: u64,
    /// Decompressed size
    pub resource_bytes: u64,
    pub status_code: u16,
    pub initiator: String,
    pub cache_control: String,
}

/// A request as seen in one particular run, with its carbon estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunObservation {
    pub entry: NetworkEntry,
    pub co2_grams: f64,
}

/// One distinct URL across all runs of a site.
///
/// `runs[i]` holds the observation from run `i + 1`, or `None` when the URL
/// did not load in that run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledResource {
    pub url: String,
    /// Scheme + host (+ port); `None` when the URL does not parse
    pub origin: Option<String>,
    pub party: Option<Party>,
    pub runs: Vec<Option<RunObservation>>,
}

impl ReconciledResource {
    /// Observation for a 1-based run number
    pub fn run(&self, run_number: u32) -> Option<&RunObservation> {
        let index = (run_number as usize).checked_sub(1)?;
        self.runs.get(index).and_then(Option::as_ref)
    }

    /// Iterate over every run in which this URL was observed
    pub fn observations(&self) -> impl Iterator<Item = &RunObservation> {
        self.runs.iter().flatten()
    }
}
