use serde::{Deserialize, Serialize};

/// Fixed leverage multiple applied to every primary-instrument move.
pub const LEVERAGE_RATIO: f64 = 2.0;

/// Shown in place of any value that is not a finite number.
pub const PLACEHOLDER: &str = "-";

// ─── Baseline ─────────────────────────────────────────────────────────────────

/// The starting triple a session is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baseline {
    /// Initial price of the underlying (TSLA)
    pub primary: f64,
    /// Initial price of the leveraged track (TSLL)
    pub leveraged: f64,
    /// Units of the leveraged track held
    pub position_size: f64,
}

impl Baseline {
    pub fn new(primary: f64, leveraged: f64, position_size: f64) -> Self {
        Self { primary, leveraged, position_size }
    }

    /// Whether mutating controls should be enabled for this baseline.
    ///
    /// All three values must be finite and non-zero. The engine itself never
    /// checks this; it is a caller-side gate.
    pub fn is_tradable(&self) -> bool {
        [self.primary, self.leveraged, self.position_size]
            .iter()
            .all(|v| v.is_finite() && *v != 0.0)
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self { primary: 100.0, leveraged: 50.0, position_size: 10.0 }
    }
}

// ─── Step ─────────────────────────────────────────────────────────────────────

/// One recorded percentage change and the prices it produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the history; reused after an undo
    pub index: usize,
    /// Percent applied to the primary price (5.0 = +5%)
    pub percent_change: f64,
    pub primary_price: f64,
    pub leveraged_price: f64,
    /// (leveraged_price - initial_leveraged) * position_size at insertion time
    pub profit: f64,
}

// ─── Simulation state ─────────────────────────────────────────────────────────

/// Everything the engine owns. Only `SimulationEngine` mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub initial_primary: f64,
    pub initial_leveraged: f64,
    pub position_size: f64,
    pub current_primary: f64,
    pub current_leveraged: f64,
    pub history: Vec<Step>,
}

impl SimulationState {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            initial_primary: baseline.primary,
            initial_leveraged: baseline.leveraged,
            position_size: baseline.position_size,
            current_primary: baseline.primary,
            current_leveraged: baseline.leveraged,
            history: Vec::new(),
        }
    }

    pub fn baseline(&self) -> Baseline {
        Baseline::new(self.initial_primary, self.initial_leveraged, self.position_size)
    }

    /// Profit of holding `position_size` units at `leveraged_price`,
    /// measured against the current baseline.
    #[inline]
    pub fn profit_for(&self, leveraged_price: f64) -> f64 {
        (leveraged_price - self.initial_leveraged) * self.position_size
    }
}

// ─── Chart point ──────────────────────────────────────────────────────────────

/// One plotted point. Step 0 is the baseline and carries no percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub step: usize,
    pub label: String,
    pub primary: f64,
    pub leveraged: f64,
    pub profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}
