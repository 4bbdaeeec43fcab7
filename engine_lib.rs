extern crate self as leverage_sim;

pub mod chart;
pub mod config;
pub mod engine;
pub mod format;
pub mod random_batch;
pub mod session;
pub mod sim;
pub mod types;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
