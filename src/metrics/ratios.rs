//! Ratio and rounding helpers shared by the summaries

pub const BYTES_PER_KB: f64 = 1024.0;

/// `numerator / denominator`, or 0 when the denominator is 0
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Percentage of `part` in `total`, 0 when `total` is 0
pub fn percentage(part: f64, total: f64) -> f64 {
    safe_ratio(part, total) * 100.0
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Bytes to KB, rounded to one decimal
pub fn bytes_to_kb(bytes: f64) -> f64 {
    round_to(bytes / BYTES_PER_KB, 1)
}
