//! Display helpers shared by every printed price, percent and profit.

use crate::types::PLACEHOLDER;

/// Render `n` with exactly two decimals, or the placeholder when `n` is NaN
/// or infinite.
///
/// Negative zero prints as `0.00`.
pub fn fmt(n: f64) -> String {
    if !n.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let n = if n == 0.0 { 0.0 } else { n };
    format!("{n:.2}")
}

/// Same as [`fmt`], with a missing value rendered as the placeholder.
pub fn fmt_opt(n: Option<f64>) -> String {
    n.map_or_else(|| PLACEHOLDER.to_string(), fmt)
}

/// `$` followed by [`fmt`]. Negative values keep the sign after the `$`.
pub fn fmt_money(n: f64) -> String {
    format!("${}", fmt(n))
}

pub fn fmt_percent(n: f64) -> String {
    format!("{}%", fmt(n))
}
