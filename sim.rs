//! Seeded random sessions, run in bulk.
//!
//! Each session starts from the configured baseline and applies `rounds`
//! random batches, exactly as a user pressing "Generate Random" then
//! "Apply Batch" would. Sessions are independent, so a sweep fans them out
//! over rayon and summarizes the final outcomes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::SimConfig;
use crate::engine::SimulationEngine;
use crate::random_batch::{generate, RngSource};

// ─── Single session ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionResult {
    pub seed: u64,
    pub steps: usize,
    pub final_primary: f64,
    pub final_leveraged: f64,
    pub final_profit: f64,
}

/// Run one session of `rounds` random batches. Same seed, same result.
pub fn run_session(config: &SimConfig, rounds: usize, seed: u64) -> SessionResult {
    let mut source = RngSource(ChaCha8Rng::seed_from_u64(seed));
    let mut engine = SimulationEngine::new(config.baseline);

    for _ in 0..rounds {
        let batch = generate(&config.batch, &mut source);
        engine.apply_batch_text(&batch);
    }

    SessionResult {
        seed,
        steps: engine.history().len(),
        final_primary: engine.current_primary(),
        final_leveraged: engine.current_leveraged(),
        final_profit: engine.current_profit(),
    }
}

// ─── Parallel sweep ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub simulations: usize,
    pub rounds: usize,
    pub mean_profit: f64,
    pub std_profit: f64,
    pub min_profit: f64,
    pub max_profit: f64,
    pub mean_final_primary: f64,
    pub mean_final_leveraged: f64,
    /// Fraction of sessions ending with profit > 0
    pub profitable_share: f64,
}

/// Run `n_sims` sessions with seeds `seed_start..seed_start + n_sims` in
/// parallel and summarize them. Seeds wrap around past `u64::MAX`.
pub fn run_sweep(config: &SimConfig, n_sims: usize, rounds: usize, seed_start: u64) -> SweepSummary {
    let results: Vec<SessionResult> = (0..n_sims)
        .into_par_iter()
        .map(|i| run_session(config, rounds, seed_start.wrapping_add(i as u64)))
        .collect();

    aggregate_results(&results, rounds)
}

fn aggregate_results(sessions: &[SessionResult], rounds: usize) -> SweepSummary {
    if sessions.is_empty() {
        return SweepSummary { rounds, ..SweepSummary::default() };
    }
    let n = sessions.len() as f64;

    let profits: Vec<f64> = sessions.iter().map(|s| s.final_profit).collect();
    let mean = profits.iter().sum::<f64>() / n;
    let var = profits.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

    SweepSummary {
        simulations: sessions.len(),
        rounds,
        mean_profit: mean,
        std_profit: var.sqrt(),
        min_profit: profits.iter().cloned().fold(f64::INFINITY, f64::min),
        max_profit: profits.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        mean_final_primary: sessions.iter().map(|s| s.final_primary).sum::<f64>() / n,
        mean_final_leveraged: sessions.iter().map(|s| s.final_leveraged).sum::<f64>() / n,
        profitable_share: profits.iter().filter(|&&p| p > 0.0).count() as f64 / n,
    }
}
