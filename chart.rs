use crate::format::fmt;
use crate::types::{ChartPoint, Step};

/// Map a history onto plot points.
///
/// Point 0 is the baseline (profit 0, no percent); point `i` mirrors
/// `history[i - 1]`. Always returns `history.len() + 1` points and never
/// touches its inputs.
pub fn project(initial_primary: f64, initial_leveraged: f64, history: &[Step]) -> Vec<ChartPoint> {
    let start = ChartPoint {
        step: 0,
        label: "Start".to_string(),
        primary: initial_primary,
        leveraged: initial_leveraged,
        profit: 0.0,
        percent: None,
    };

    std::iter::once(start)
        .chain(history.iter().map(|s| ChartPoint {
            step: s.index,
            label: format!("#{} ({}%)", s.index, fmt(s.percent_change)),
            primary: s.primary_price,
            leveraged: s.leveraged_price,
            profit: s.profit,
            percent: Some(s.percent_change),
        }))
        .collect()
}

/// Hover text for a point: `Step 3 • Δ -1.00%`, or just `Step 0` for the
/// baseline.
pub fn tooltip_label(point: &ChartPoint) -> String {
    match point.percent.filter(|p| p.is_finite()) {
        Some(p) => format!("Step {} • Δ {}%", point.step, fmt(p)),
        None => format!("Step {}", point.step),
    }
}
