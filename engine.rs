//! Leveraged price-track simulation engine.
//!
//! Holds a baseline (initial primary price, initial leveraged price, position
//! size) and a history of percentage moves. Each move is applied to the
//! primary price and doubled for the leveraged price:
//!
//!   primary'   = primary   * (1 + d/100)
//!   leveraged' = leveraged * (1 + 2·d/100)
//!
//! Prices always compound from the baseline through every recorded step, so
//! undo only has to pop the log and re-point the current prices.

use tracing::{debug, trace};

use crate::chart;
use crate::types::{Baseline, ChartPoint, SimulationState, Step, LEVERAGE_RATIO};

// ─── Tokenizing ───────────────────────────────────────────────────────────────

/// Split batch text on any run of commas, whitespace or newlines.
pub fn split_batch_text(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse one token (`+5`, `-3`, `2.5`, ...). `None` unless the result is finite.
pub fn parse_percent(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ─── Engine ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SimulationEngine {
    state: SimulationState,
}

impl SimulationEngine {
    pub fn new(baseline: Baseline) -> Self {
        Self { state: SimulationState::new(baseline) }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn history(&self) -> &[Step] {
        &self.state.history
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.state.history.last()
    }

    pub fn baseline(&self) -> Baseline {
        self.state.baseline()
    }

    pub fn current_primary(&self) -> f64 {
        self.state.current_primary
    }

    pub fn current_leveraged(&self) -> f64 {
        self.state.current_leveraged
    }

    /// Rebind the baseline. Current prices and history are left alone; call
    /// [`reset_to_initial`](Self::reset_to_initial) to restart from it.
    ///
    /// No validation happens here. See [`Baseline::is_tradable`].
    pub fn set_initial(&mut self, primary: f64, leveraged: f64, position_size: f64) {
        debug!(primary, leveraged, position_size, "baseline rebound");
        self.state.initial_primary = primary;
        self.state.initial_leveraged = leveraged;
        self.state.position_size = position_size;
    }

    /// Restore current prices to the baseline and drop the history.
    pub fn reset_to_initial(&mut self) {
        debug!(dropped = self.state.history.len(), "reset to baseline");
        self.state.current_primary = self.state.initial_primary;
        self.state.current_leveraged = self.state.initial_leveraged;
        self.state.history.clear();
    }

    /// Same effect as [`reset_to_initial`](Self::reset_to_initial).
    pub fn clear_history(&mut self) {
        self.reset_to_initial();
    }

    /// Apply one percentage move and record it.
    ///
    /// A non-finite `delta_percent` is ignored and returns `None`.
    pub fn apply_change(&mut self, delta_percent: f64) -> Option<&Step> {
        if !delta_percent.is_finite() {
            trace!(delta_percent, "non-finite change skipped");
            return None;
        }

        let primary_mult = 1.0 + delta_percent / 100.0;
        let leveraged_mult = 1.0 + LEVERAGE_RATIO * delta_percent / 100.0;

        let next_primary = self.state.current_primary * primary_mult;
        let next_leveraged = self.state.current_leveraged * leveraged_mult;

        let step = Step {
            index: self.state.history.len() + 1,
            percent_change: delta_percent,
            primary_price: next_primary,
            leveraged_price: next_leveraged,
            profit: self.state.profit_for(next_leveraged),
        };

        self.state.current_primary = next_primary;
        self.state.current_leveraged = next_leveraged;
        self.state.history.push(step);

        debug!(
            step = step.index,
            delta_percent,
            primary = next_primary,
            leveraged = next_leveraged,
            profit = step.profit,
            "change applied"
        );
        self.state.history.last()
    }

    /// Apply every parseable token in order. Tokens that do not parse to a
    /// finite number are skipped without producing a step.
    ///
    /// Returns the number of steps appended.
    pub fn apply_batch<S: AsRef<str>>(&mut self, tokens: &[S]) -> usize {
        let mut applied = 0;
        for tok in tokens {
            let tok = tok.as_ref();
            match parse_percent(tok) {
                Some(v) => {
                    self.apply_change(v);
                    applied += 1;
                }
                None => trace!(token = tok, "unparseable batch token skipped"),
            }
        }
        debug!(applied, total = tokens.len(), "batch applied");
        applied
    }

    /// Tokenize `text` with [`split_batch_text`] and apply it as a batch.
    pub fn apply_batch_text(&mut self, text: &str) -> usize {
        self.apply_batch(&split_batch_text(text))
    }

    /// Drop the most recent step and return it. No-op on an empty history.
    pub fn undo_last(&mut self) -> Option<Step> {
        let removed = self.state.history.pop()?;
        match self.state.history.last() {
            Some(last) => {
                self.state.current_primary = last.primary_price;
                self.state.current_leveraged = last.leveraged_price;
            }
            None => {
                self.state.current_primary = self.state.initial_primary;
                self.state.current_leveraged = self.state.initial_leveraged;
            }
        }
        debug!(step = removed.index, remaining = self.state.history.len(), "step undone");
        Some(removed)
    }

    /// `(current_leveraged - initial_leveraged) * position_size`
    pub fn current_profit(&self) -> f64 {
        self.state.profit_for(self.state.current_leveraged)
    }

    /// Profit of `step` restated against the *current* baseline and position.
    /// Differs from `step.profit` only if the baseline changed after the step
    /// was recorded.
    pub fn profit_at(&self, step: &Step) -> f64 {
        self.state.profit_for(step.leveraged_price)
    }

    pub fn chart_series(&self) -> Vec<ChartPoint> {
        chart::project(
            self.state.initial_primary,
            self.state.initial_leveraged,
            &self.state.history,
        )
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(Baseline::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_spaces_and_newlines() {
        assert_eq!(split_batch_text("+5, -3,2.5\n\n -1"), vec!["+5", "-3", "2.5", "-1"]);
        assert!(split_batch_text(" ,\n\t, ").is_empty());
    }

    #[test]
    fn parse_percent_rejects_garbage_and_non_finite() {
        assert_eq!(parse_percent("+5"), Some(5.0));
        assert_eq!(parse_percent("-2.5"), Some(-2.5));
        assert_eq!(parse_percent(".5"), Some(0.5));
        assert_eq!(parse_percent("abc"), None);
        assert_eq!(parse_percent("inf"), None);
        assert_eq!(parse_percent("NaN"), None);
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn non_finite_change_is_ignored() {
        let mut engine = SimulationEngine::default();
        assert!(engine.apply_change(f64::NAN).is_none());
        assert!(engine.apply_change(f64::INFINITY).is_none());
        assert!(engine.history().is_empty());
        assert_eq!(engine.current_primary(), 100.0);
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut engine = SimulationEngine::default();
        assert!(engine.undo_last().is_none());
        assert_eq!(engine.current_leveraged(), 50.0);
    }

    #[test]
    fn indices_are_reused_after_undo() {
        let mut engine = SimulationEngine::default();
        engine.apply_change(1.0);
        engine.apply_change(2.0);
        engine.undo_last();
        let idx = engine.apply_change(3.0).map(|s| s.index);
        assert_eq!(idx, Some(2));
    }

    #[test]
    fn rebinding_baseline_keeps_history_and_freezes_step_profit() {
        let mut engine = SimulationEngine::default();
        engine.apply_change(5.0);
        engine.set_initial(100.0, 50.0, 20.0);

        let step = *engine.last_step().unwrap();
        assert_eq!(engine.history().len(), 1);
        assert!((step.profit - 50.0).abs() < 1e-9);
        assert!((engine.profit_at(&step) - 100.0).abs() < 1e-9);
        assert!((engine.current_profit() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_leveraged_baseline_is_not_special_cased() {
        let mut engine = SimulationEngine::new(Baseline::new(100.0, 0.0, 10.0));
        engine.apply_change(5.0);
        assert_eq!(engine.current_leveraged(), 0.0);
        assert_eq!(engine.current_profit(), 0.0);
    }
}
