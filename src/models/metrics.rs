//! Run-level metric types
//!
//! One `RunMetrics` record per captured run, plus the synthetic
//! "average (median)" record derived from all runs of a site.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label used for the filename and iteration of the synthetic median record
pub const AVERAGE_LABEL: &str = "average (median)";

/// Identifies a run: a captured iteration (1-based) or the synthetic average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Iteration {
    Run(u32),
    Average,
}

impl Iteration {
    /// Run number for captured runs, `None` for the synthetic average
    pub fn run_number(&self) -> Option<u32> {
        match self {
            Iteration::Run(n) => Some(*n),
            Iteration::Average => None,
        }
    }
}

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iteration::Run(n) => write!(f, "{}", n),
            Iteration::Average => write!(f, "average"),
        }
    }
}

impl Serialize for Iteration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Iteration::Run(n) => serializer.serialize_u32(*n),
            Iteration::Average => serializer.serialize_str("average"),
        }
    }
}

impl<'de> Deserialize<'de> for Iteration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Iteration::Run(n)),
            Raw::Text(s) if s == "average" || s == "median" => Ok(Iteration::Average),
            Raw::Text(s) => s
                .parse::<u32>()
                .map(Iteration::Run)
                .map_err(|_| serde::de::Error::custom(format!("invalid iteration: {}", s))),
        }
    }
}

/// Numeric fields of a `RunMetrics` record.
///
/// This list is shared by trace parsing and by the per-field median, so
/// adding a metric here is enough for it to take part in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    PerformanceScore,
    LcpMs,
    FcpMs,
    TtfbMs,
    Requests,
    TotalBytes,
    TotalKb,
    TbtMs,
    Cls,
    TtiMs,
    JsBytes,
    ThirdPartyBytes,
    ThirdPartyRequests,
    MainThreadMs,
    LongTasksCount,
    LargestLongTaskMs,
    Co2Grams,
}

impl MetricField {
    pub const ALL: [MetricField; 17] = [
        MetricField::PerformanceScore,
        MetricField::LcpMs,
        MetricField::FcpMs,
        MetricField::TtfbMs,
        MetricField::Requests,
        MetricField::TotalBytes,
        MetricField::TotalKb,
        MetricField::TbtMs,
        MetricField::Cls,
        MetricField::TtiMs,
        MetricField::JsBytes,
        MetricField::ThirdPartyBytes,
        MetricField::ThirdPartyRequests,
        MetricField::MainThreadMs,
        MetricField::LongTasksCount,
        MetricField::LargestLongTaskMs,
        MetricField::Co2Grams,
    ];

    /// Column name used in tabular output
    pub fn name(&self) -> &'static str {
        match self {
            MetricField::PerformanceScore => "performance_score",
            MetricField::LcpMs => "lcp_ms",
            MetricField::FcpMs => "fcp_ms",
            MetricField::TtfbMs => "ttfb_ms",
            MetricField::Requests => "requests",
            MetricField::TotalBytes => "total_bytes",
            MetricField::TotalKb => "total_kb",
            MetricField::TbtMs => "tbt_ms",
            MetricField::Cls => "cls",
            MetricField::TtiMs => "tti_ms",
            MetricField::JsBytes => "js_bytes",
            MetricField::ThirdPartyBytes => "third_party_bytes",
            MetricField::ThirdPartyRequests => "third_party_requests",
            MetricField::MainThreadMs => "main_thread_ms",
            MetricField::LongTasksCount => "long_tasks_count",
            MetricField::LargestLongTaskMs => "largest_long_task_ms",
            MetricField::Co2Grams => "co2_grams",
        }
    }
}

/// Metrics for a single run (or the synthetic median of all runs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub iteration: Iteration,
    pub run_filename: String,
    pub performance_score: f64,
    pub lcp_ms: f64,
    pub fcp_ms: f64,
    pub ttfb_ms: f64,
    pub requests: f64,
    pub total_bytes: f64,
    pub total_kb: f64,
    pub tbt_ms: f64,
    pub cls: f64,
    pub tti_ms: f64,
    pub js_bytes: f64,
    pub third_party_bytes: f64,
    pub third_party_requests: f64,
    pub main_thread_ms: f64,
    pub long_tasks_count: f64,
    pub largest_long_task_ms: f64,
    pub co2_grams: f64,
    pub notes: String,
}

impl RunMetrics {
    /// Create a record with every numeric field set to zero
    pub fn zeroed(iteration: Iteration, run_filename: String) -> Self {
        let notes = match iteration {
            Iteration::Run(n) => format!("run {}", n),
            Iteration::Average => AVERAGE_LABEL.to_string(),
        };

        Self {
            iteration,
            run_filename,
            performance_score: 0.0,
            lcp_ms: 0.0,
            fcp_ms: 0.0,
            ttfb_ms: 0.0,
            requests: 0.0,
            total_bytes: 0.0,
            total_kb: 0.0,
            tbt_ms: 0.0,
            cls: 0.0,
            tti_ms: 0.0,
            js_bytes: 0.0,
            third_party_bytes: 0.0,
            third_party_requests: 0.0,
            main_thread_ms: 0.0,
            long_tasks_count: 0.0,
            largest_long_task_ms: 0.0,
            co2_grams: 0.0,
            notes,
        }
    }

    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::PerformanceScore => self.performance_score,
            MetricField::LcpMs => self.lcp_ms,
            MetricField::FcpMs => self.fcp_ms,
            MetricField::TtfbMs => self.ttfb_ms,
            MetricField::Requests => self.requests,
            MetricField::TotalBytes => self.total_bytes,
            MetricField::TotalKb => self.total_kb,
            MetricField::TbtMs => self.tbt_ms,
            MetricField::Cls => self.cls,
            MetricField::TtiMs => self.tti_ms,
            MetricField::JsBytes => self.js_bytes,
            MetricField::ThirdPartyBytes => self.third_party_bytes,
            MetricField::ThirdPartyRequests => self.third_party_requests,
            MetricField::MainThreadMs => self.main_thread_ms,
            MetricField::LongTasksCount => self.long_tasks_count,
            MetricField::LargestLongTaskMs => self.largest_long_task_ms,
            MetricField::Co2Grams => self.co2_grams,
        }
    }

    pub fn set(&mut self, field: MetricField, value: f64) {
        let slot = match field {
            MetricField::PerformanceScore => &mut self.performance_score,
            MetricField::LcpMs => &mut self.lcp_ms,
            MetricField::FcpMs => &mut self.fcp_ms,
            MetricField::TtfbMs => &mut self.ttfb_ms,
            MetricField::Requests => &mut self.requests,
            MetricField::TotalBytes => &mut self.total_bytes,
            MetricField::TotalKb => &mut self.total_kb,
            MetricField::TbtMs => &mut self.tbt_ms,
            MetricField::Cls => &mut self.cls,
            MetricField::TtiMs => &mut self.tti_ms,
            MetricField::JsBytes => &mut self.js_bytes,
            MetricField::ThirdPartyBytes => &mut self.third_party_bytes,
            MetricField::ThirdPartyRequests => &mut self.third_party_requests,
            MetricField::MainThreadMs => &mut self.main_thread_ms,
            MetricField::LongTasksCount => &mut self.long_tasks_count,
            MetricField::LargestLongTaskMs => &mut self.largest_long_task_ms,
            MetricField::Co2Grams => &mut self.co2_grams,
        };
        *slot = value;
    }

    /// Whether this is the synthetic median record
    pub fn is_average(&self) -> bool {
        self.iteration == Iteration::Average
    }
}
