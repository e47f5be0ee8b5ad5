//! Median utilities
//!
//! Field-wise median of run metrics and representative-run selection

use crate::models::{Iteration, MetricField, RunMetrics, AVERAGE_LABEL};

/// Standard statistical median; 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Synthetic record holding the median of every numeric field.
///
/// Each field is taken independently, so the result need not match any
/// single captured run.
pub fn synthetic_average(runs: &[RunMetrics]) -> RunMetrics {
    let mut average = RunMetrics::zeroed(Iteration::Average, AVERAGE_LABEL.to_string());

    for field in MetricField::ALL {
        let values: Vec<f64> = runs.iter().map(|r| r.get(field)).collect();
        average.set(field, median(&values));
    }

    average
}

/// Raw runs followed by their synthetic average
pub fn with_average(runs: Vec<RunMetrics>) -> Vec<RunMetrics> {
    let average = synthetic_average(&runs);
    let mut all = runs;
    all.push(average);
    all
}

/// Index of the total closest to `target`; the lowest index wins ties
pub fn select_representative(totals: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, total) in totals.iter().enumerate() {
        let diff = (total - target).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((index, diff)),
        }
    }

    best.map(|(index, _)| index)
}
