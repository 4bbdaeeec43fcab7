//! Random percentage batches, e.g. `"+2.5, -1.2, 0, +4.03, -3"`.
//!
//! The output is plain text meant to pre-fill the batch input, so it goes
//! back through the same tokenizer as anything a user types.

use rand::Rng;
use serde::{Deserialize, Serialize};

// ─── Random source ────────────────────────────────────────────────────────────

/// Anything that can hand out uniform draws in `[0, 1)`.
pub trait UnitSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapter from any `rand` generator.
pub struct RngSource<R>(pub R);

impl<R: Rng> UnitSource for RngSource<R> {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
/// An empty list always yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct FixedUnits {
    units: Vec<f64>,
    pos: usize,
}

impl FixedUnits {
    pub fn new(units: Vec<f64>) -> Self {
        Self { units, pos: 0 }
    }
}

impl UnitSource for FixedUnits {
    fn next_unit(&mut self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        let u = self.units[self.pos % self.units.len()];
        self.pos += 1;
        u
    }
}

// ─── Batch spec ───────────────────────────────────────────────────────────────

/// Shape of a generated batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSpec {
    /// Lowest percent a token may take
    pub min: f64,
    /// Highest percent a token may take
    pub max: f64,
    /// Number of tokens
    pub count: usize,
    /// Digits kept after rounding
    pub decimals: u32,
}

impl Default for BatchSpec {
    fn default() -> Self {
        Self { min: -5.0, max: 5.0, count: 5, decimals: 2 }
    }
}

/// Most digits a token may keep; past this `f64` cannot tell them apart.
pub const MAX_DECIMALS: u32 = 15;

impl BatchSpec {
    /// Smallest and largest values with `decimals` digits that lie inside
    /// `[min, max]`, or `None` when there are none.
    pub fn bounds_at_precision(&self) -> Option<(f64, f64)> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return None;
        }
        let factor = 10f64.powi(self.decimals.min(MAX_DECIMALS) as i32);
        let lo = (self.min * factor - 1e-9).ceil() / factor;
        let hi = (self.max * factor + 1e-9).floor() / factor;
        (lo.is_finite() && hi.is_finite() && lo <= hi).then_some((lo, hi))
    }
}

// ─── Generation ───────────────────────────────────────────────────────────────

/// Draw `spec.count` tokens from `source` and join them with `", "`.
///
/// Each value is `min + u * (max - min)`, rounded to `spec.decimals` and
/// kept inside `[min, max]` when rounding would step outside it.
pub fn generate<S: UnitSource + ?Sized>(spec: &BatchSpec, source: &mut S) -> String {
    let decimals = spec.decimals.min(MAX_DECIMALS);
    let bounds = spec.bounds_at_precision();
    (0..spec.count)
        .map(|_| {
            let mut v = round_to(spec.min + source.next_unit() * (spec.max - spec.min), decimals);
            if let Some((lo, hi)) = bounds {
                v = v.max(lo).min(hi);
            }
            render_token(v, decimals)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// [`generate`] backed by the thread-local RNG. Resampled on every call.
pub fn generate_random_batch(spec: &BatchSpec) -> String {
    generate(spec, &mut RngSource(rand::thread_rng()))
}

#[inline]
fn round_to(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round() / factor
}

/// Round `v` to `decimals`, then print it with an explicit `+` for positive
/// values and without trailing zeros (`2.50` → `+2.5`, `0.00` → `0`).
///
/// `decimals` above [`MAX_DECIMALS`] is treated as `MAX_DECIMALS`.
pub fn render_token(v: f64, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let mut v = round_to(v, decimals);
    if v == 0.0 {
        v = 0.0; // drop the sign of -0
    }

    let fixed = format!("{:.*}", decimals as usize, v);
    let body = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };

    let sign = if v > 0.0 { "+" } else { "" };
    format!("{sign}{body}")
}
