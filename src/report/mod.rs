//! Site reporting
//!
//! - `site`: builds the report for one site from its captured runs
//! - `batch`: runs many sites concurrently with per-site failure isolation

pub mod batch;
pub mod site;

pub use batch::{process_sites, BatchSummary, SiteOutcome};
pub use site::{build_site_report, ReportSettings};
