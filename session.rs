//! Form-level state on top of the engine.
//!
//! The engine only ever sees numbers. Everything a user types lives here as
//! text until it is committed, and every button of the form maps to one
//! method below.

use tracing::debug;

use crate::config::SimConfig;
use crate::engine::SimulationEngine;
use crate::format::fmt;
use crate::random_batch::{generate, generate_random_batch, BatchSpec, UnitSource};

/// Read free text the way the form does: blank means 0, anything that is not
/// a number becomes NaN.
pub fn parse_field(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Range and granularity of the percent slider.
pub const PCT_SLIDER_MIN: f64 = -20.0;
pub const PCT_SLIDER_MAX: f64 = 20.0;
pub const PCT_SLIDER_STEP: f64 = 0.1;

// ─── Numeric fields ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Tidied to two decimals on commit
    Price,
    /// Tidied to its shortest display form on commit
    Count,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    InitialPrimary,
    InitialLeveraged,
    PositionSize,
}

/// An input box: what the user is typing plus the last accepted value.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericField {
    text: String,
    value: f64,
    kind: FieldKind,
}

impl NumericField {
    pub fn new(value: f64, kind: FieldKind) -> Self {
        Self { text: value.to_string(), value, kind }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Accept the interim text if it is a finite number, otherwise put the
    /// last accepted value back. Returns whether the value was accepted.
    pub fn commit(&mut self) -> bool {
        let n = parse_field(&self.text);
        if n.is_finite() {
            self.value = n;
            self.text = match self.kind {
                FieldKind::Price => format!("{n:.2}"),
                FieldKind::Count => n.to_string(),
            };
            true
        } else {
            self.text = format!("{:.2}", self.value);
            false
        }
    }

    /// What the interim text currently reads as.
    pub fn pending(&self) -> f64 {
        parse_field(&self.text)
    }
}

// ─── Session ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct FormSession {
    engine: SimulationEngine,
    initial_primary: NumericField,
    initial_leveraged: NumericField,
    position_size: NumericField,
    pub pct_input: String,
    pub batch_input: String,
    batch_spec: BatchSpec,
}

impl FormSession {
    pub fn new(config: &SimConfig) -> Self {
        let b = config.baseline;
        Self {
            engine: SimulationEngine::new(b),
            initial_primary: NumericField::new(b.primary, FieldKind::Price),
            initial_leveraged: NumericField::new(b.leveraged, FieldKind::Price),
            position_size: NumericField::new(b.position_size, FieldKind::Count),
            pct_input: "0".to_string(),
            batch_input: String::new(),
            batch_spec: config.batch,
        }
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn field(&self, field: Field) -> &NumericField {
        match field {
            Field::InitialPrimary => &self.initial_primary,
            Field::InitialLeveraged => &self.initial_leveraged,
            Field::PositionSize => &self.position_size,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut NumericField {
        match field {
            Field::InitialPrimary => &mut self.initial_primary,
            Field::InitialLeveraged => &mut self.initial_leveraged,
            Field::PositionSize => &mut self.position_size,
        }
    }

    pub fn edit(&mut self, field: Field, text: impl Into<String>) {
        self.field_mut(field).edit(text);
    }

    /// Commit one field and push the committed baseline into the engine.
    /// History and current prices are not touched.
    pub fn commit(&mut self, field: Field) -> bool {
        let accepted = self.field_mut(field).commit();
        self.engine.set_initial(
            self.initial_primary.value(),
            self.initial_leveraged.value(),
            self.position_size.value(),
        );
        debug!(?field, accepted, "field committed");
        accepted
    }

    /// True while any of the three inputs reads as zero or not-a-number.
    pub fn controls_disabled(&self) -> bool {
        [&self.initial_primary, &self.initial_leveraged, &self.position_size]
            .iter()
            .any(|f| {
                let n = f.pending();
                !n.is_finite() || n == 0.0
            })
    }

    // ── Percent input ─────────────────────────────────────────────────────────

    /// The −/+ buttons: shift the percent input by `delta`. Text that is not
    /// a number starts over at `0.00`.
    pub fn nudge_pct(&mut self, delta: f64) -> bool {
        if self.controls_disabled() {
            return false;
        }
        let n = parse_field(&self.pct_input);
        self.pct_input = if n.is_finite() { fmt(n + delta) } else { "0.00".to_string() };
        true
    }

    /// Tidy the percent input when the user leaves it. Never gated.
    pub fn commit_pct(&mut self) {
        let n = parse_field(&self.pct_input);
        self.pct_input = if n.is_finite() { fmt(n) } else { "0".to_string() };
    }

    /// Drag the slider to `value`, snapped to its step and kept in range.
    pub fn slide_pct(&mut self, value: f64) -> bool {
        if self.controls_disabled() {
            return false;
        }
        self.pct_input = if value.is_finite() {
            let snapped = (value / PCT_SLIDER_STEP).round() * PCT_SLIDER_STEP;
            fmt(snapped.clamp(PCT_SLIDER_MIN, PCT_SLIDER_MAX))
        } else {
            "0".to_string()
        };
        true
    }

    /// Where the slider thumb sits for the current percent input.
    pub fn slider_position(&self) -> f64 {
        let n = parse_field(&self.pct_input);
        if n.is_finite() {
            n.clamp(PCT_SLIDER_MIN, PCT_SLIDER_MAX)
        } else {
            0.0
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    /// Restart from the committed baseline and zero the percent input.
    pub fn set_as_initial(&mut self) {
        self.engine.reset_to_initial();
        self.pct_input = "0".to_string();
    }

    pub fn clear_history(&mut self) {
        self.engine.clear_history();
        self.pct_input = "0".to_string();
    }

    /// Apply the percent input as one step. Returns whether a step was added.
    pub fn apply_pct_input(&mut self) -> bool {
        if self.controls_disabled() {
            return false;
        }
        let pct = parse_field(&self.pct_input);
        self.engine.apply_change(pct).is_some()
    }

    pub fn undo_last(&mut self) -> bool {
        if self.controls_disabled() {
            return false;
        }
        self.engine.undo_last().is_some()
    }

    /// Replace the batch input with a fresh random batch.
    pub fn generate_random_batch(&mut self) -> bool {
        if self.controls_disabled() {
            return false;
        }
        self.batch_input = generate_random_batch(&self.batch_spec);
        true
    }

    /// Like [`generate_random_batch`](Self::generate_random_batch) with an
    /// explicit random source.
    pub fn generate_random_batch_with<S: UnitSource + ?Sized>(&mut self, source: &mut S) -> bool {
        if self.controls_disabled() {
            return false;
        }
        self.batch_input = generate(&self.batch_spec, source);
        true
    }

    /// Apply the batch input. Returns the number of steps appended.
    pub fn apply_batch_input(&mut self) -> usize {
        if self.controls_disabled() || self.batch_input.trim().is_empty() {
            return 0;
        }
        self.engine.apply_batch_text(&self.batch_input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_batch::FixedUnits;

    fn session() -> FormSession {
        FormSession::new(&SimConfig::default())
    }

    #[test]
    fn blank_reads_as_zero_and_garbage_as_nan() {
        assert_eq!(parse_field("  "), 0.0);
        assert_eq!(parse_field("12.5"), 12.5);
        assert!(parse_field("12,5").is_nan());
    }

    #[test]
    fn commit_tidies_price_text() {
        let mut s = session();
        s.edit(Field::InitialPrimary, "250");
        assert!(s.commit(Field::InitialPrimary));
        assert_eq!(s.field(Field::InitialPrimary).text(), "250.00");
        assert_eq!(s.engine().baseline().primary, 250.0);
    }

    #[test]
    fn commit_keeps_count_short() {
        let mut s = session();
        s.edit(Field::PositionSize, "12.50");
        assert!(s.commit(Field::PositionSize));
        assert_eq!(s.field(Field::PositionSize).text(), "12.5");
    }

    #[test]
    fn failed_commit_reverts_text() {
        let mut s = session();
        s.edit(Field::InitialLeveraged, "abc");
        assert!(s.controls_disabled());
        assert!(!s.commit(Field::InitialLeveraged));
        assert_eq!(s.field(Field::InitialLeveraged).text(), "50.00");
        assert_eq!(s.field(Field::InitialLeveraged).value(), 50.0);
        assert!(!s.controls_disabled());
    }

    #[test]
    fn disabled_controls_block_mutation() {
        let mut s = session();
        s.pct_input = "2".to_string();
        assert!(s.apply_pct_input());
        s.edit(Field::PositionSize, "0");
        s.pct_input = "5".to_string();
        assert!(!s.apply_pct_input());
        assert!(!s.undo_last());
        s.batch_input = "+1, +2".to_string();
        assert_eq!(s.apply_batch_input(), 0);
        assert!(!s.generate_random_batch());
        assert!(!s.nudge_pct(1.0));
        assert!(!s.slide_pct(3.0));
        assert_eq!(s.pct_input, "5");
        assert_eq!(s.engine().history().len(), 1);
    }

    #[test]
    fn nudge_steps_by_one_with_two_decimals() {
        let mut s = session();
        assert!(s.nudge_pct(1.0));
        assert_eq!(s.pct_input, "1.00");
        s.pct_input = "2.5".to_string();
        assert!(s.nudge_pct(-1.0));
        assert_eq!(s.pct_input, "1.50");
        s.pct_input = "1".to_string();
        s.nudge_pct(-1.0);
        assert_eq!(s.pct_input, "0.00");
        s.pct_input = "abc".to_string();
        s.nudge_pct(1.0);
        assert_eq!(s.pct_input, "0.00");
    }

    #[test]
    fn commit_pct_tidies_or_falls_back_to_zero() {
        let mut s = session();
        s.pct_input = "3.14159".to_string();
        s.commit_pct();
        assert_eq!(s.pct_input, "3.14");
        s.pct_input = "nope".to_string();
        s.commit_pct();
        assert_eq!(s.pct_input, "0");
        s.pct_input = "   ".to_string();
        s.commit_pct();
        assert_eq!(s.pct_input, "0.00");
    }

    #[test]
    fn slider_clamps_and_snaps() {
        let mut s = session();
        assert!(s.slide_pct(35.0));
        assert_eq!(s.pct_input, "20.00");
        s.slide_pct(-99.0);
        assert_eq!(s.pct_input, "-20.00");
        s.slide_pct(3.14);
        assert_eq!(s.pct_input, "3.10");
        s.slide_pct(f64::NAN);
        assert_eq!(s.pct_input, "0");

        s.pct_input = "45".to_string();
        assert_eq!(s.slider_position(), PCT_SLIDER_MAX);
        s.pct_input = "x".to_string();
        assert_eq!(s.slider_position(), 0.0);
    }

    #[test]
    fn pct_input_applies_one_step() {
        let mut s = session();
        s.pct_input = "+5".to_string();
        assert!(s.apply_pct_input());
        assert!((s.engine().current_primary() - 105.0).abs() < 1e-9);
        assert!(s.undo_last());
        assert!(!s.undo_last());
    }

    #[test]
    fn random_batch_feeds_batch_apply() {
        let mut s = session();
        let mut src = FixedUnits::new(vec![0.75, 0.25]);
        assert!(s.generate_random_batch_with(&mut src));
        assert_eq!(s.batch_input, "+2.5, -2.5, +2.5, -2.5, +2.5");
        assert_eq!(s.apply_batch_input(), 5);
        assert_eq!(s.engine().history().len(), 5);
    }

    #[test]
    fn blank_batch_is_noop() {
        let mut s = session();
        s.batch_input = " \n ".to_string();
        assert_eq!(s.apply_batch_input(), 0);
    }

    #[test]
    fn set_as_initial_restarts_from_committed_baseline() {
        let mut s = session();
        s.pct_input = "3".to_string();
        s.apply_pct_input();
        s.edit(Field::InitialPrimary, "200");
        s.commit(Field::InitialPrimary);
        s.set_as_initial();
        assert!(s.engine().history().is_empty());
        assert_eq!(s.engine().current_primary(), 200.0);
        assert_eq!(s.pct_input, "0");
    }
}
