use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use leverage_sim::chart::tooltip_label;
use leverage_sim::config::SimConfig;
use leverage_sim::engine::SimulationEngine;
use leverage_sim::format::{fmt_money, fmt_opt, fmt_percent};
use leverage_sim::random_batch::{generate, generate_random_batch, RngSource};
use leverage_sim::session::{Field, FormSession};
use leverage_sim::sim::run_sweep;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tsll-sim", about = "What-if simulator for a 2x leveraged price track")]
struct Cli {
	/// JSON file with baseline and random-batch defaults
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Replay a list of percent changes and print the result
	Run {
		#[arg(long)]
		primary: Option<f64>,
		#[arg(long)]
		leveraged: Option<f64>,
		#[arg(long)]
		position: Option<f64>,
		/// Percent changes, e.g. "+5, -3, 2.5, -1"
		#[arg(long, allow_hyphen_values = true)]
		changes: Option<String>,
		/// Fill the changes with a random batch instead
		#[arg(long, conflicts_with = "changes")]
		random: bool,
		/// Also print the chart series as JSON
		#[arg(long)]
		chart_json: bool,
	},
	/// Print one random batch
	Random {
		#[arg(long, allow_hyphen_values = true)]
		min: Option<f64>,
		#[arg(long, allow_hyphen_values = true)]
		max: Option<f64>,
		#[arg(long)]
		count: Option<usize>,
		#[arg(long)]
		decimals: Option<u32>,
		#[arg(long)]
		seed: Option<u64>,
	},
	/// Line-oriented version of the form
	Interactive,
	/// Run many seeded random sessions in parallel
	Sweep {
		#[arg(long, default_value_t = 1_000)]
		simulations: usize,
		#[arg(long, default_value_t = 10)]
		rounds: usize,
		#[arg(long, default_value_t = 0)]
		seed_start: u64,
		#[arg(long)]
		json: bool,
	},
}

fn main() -> Result<()> {
	init_tracing();
	let cli = Cli::parse();
	let config = load_config(cli.config.as_deref())?;

	match cli.command {
		Commands::Run {
			primary,
			leveraged,
			position,
			changes,
			random,
			chart_json,
		} => run_cmd(config, primary, leveraged, position, changes, random, chart_json),
		Commands::Random {
			min,
			max,
			count,
			decimals,
			seed,
		} => random_cmd(config, min, max, count, decimals, seed),
		Commands::Interactive => interactive_cmd(&config),
		Commands::Sweep {
			simulations,
			rounds,
			seed_start,
			json,
		} => sweep_cmd(&config, simulations, rounds, seed_start, json),
	}
}

fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(io::stderr)
		.init();
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
	match path {
		Some(p) => {
			let config = SimConfig::from_json_file(p)
				.with_context(|| format!("loading config {}", p.display()))?;
			info!(path = %p.display(), "config loaded");
			Ok(config)
		}
		None => Ok(SimConfig::default()),
	}
}

fn run_cmd(
	mut config: SimConfig,
	primary: Option<f64>,
	leveraged: Option<f64>,
	position: Option<f64>,
	changes: Option<String>,
	random: bool,
	chart_json: bool,
) -> Result<()> {
	if let Some(p) = primary {
		config.baseline.primary = p;
	}
	if let Some(l) = leveraged {
		config.baseline.leveraged = l;
	}
	if let Some(n) = position {
		config.baseline.position_size = n;
	}
	if !config.baseline.is_tradable() {
		bail!("initial prices and position size must be finite and non-zero");
	}

	let changes = match changes {
		Some(c) => c,
		None if random => generate_random_batch(&config.batch),
		None => String::new(),
	};

	let mut engine = SimulationEngine::new(config.baseline);
	let applied = engine.apply_batch_text(&changes);
	info!(applied, "changes replayed");
	if random {
		println!("Batch: {changes}\n");
	}

	print_summary(&engine);
	println!();
	print_history(&engine);

	if chart_json {
		println!("\n{}", serde_json::to_string_pretty(&engine.chart_series())?);
	}
	Ok(())
}

fn random_cmd(
	mut config: SimConfig,
	min: Option<f64>,
	max: Option<f64>,
	count: Option<usize>,
	decimals: Option<u32>,
	seed: Option<u64>,
) -> Result<()> {
	let spec = &mut config.batch;
	spec.min = min.unwrap_or(spec.min);
	spec.max = max.unwrap_or(spec.max);
	spec.count = count.unwrap_or(spec.count);
	spec.decimals = decimals.unwrap_or(spec.decimals);
	config.validate()?;

	let batch = match seed {
		Some(s) => generate(&config.batch, &mut RngSource(ChaCha8Rng::seed_from_u64(s))),
		None => generate_random_batch(&config.batch),
	};
	println!("{batch}");
	Ok(())
}

fn sweep_cmd(config: &SimConfig, simulations: usize, rounds: usize, seed_start: u64, json: bool) -> Result<()> {
	if !config.baseline.is_tradable() {
		bail!("initial prices and position size must be finite and non-zero");
	}
	info!(simulations, rounds, seed_start, "sweep started");
	let s = run_sweep(config, simulations, rounds, seed_start);

	if json {
		println!("{}", serde_json::to_string_pretty(&s)?);
		return Ok(());
	}

	println!("Sessions  Rounds   Mean P/L    Std P/L    Min P/L    Max P/L   Mean TSLA  Mean TSLL  Win%");
	println!("---------------------------------------------------------------------------------------------");
	println!(
		"{:>8} {:>7} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>11.2} {:>10.2} {:>5.1}",
		s.simulations,
		s.rounds,
		s.mean_profit,
		s.std_profit,
		s.min_profit,
		s.max_profit,
		s.mean_final_primary,
		s.mean_final_leveraged,
		s.profitable_share * 100.0
	);
	Ok(())
}

// ─── Interactive form ─────────────────────────────────────────────────────────

const HELP: &str = "\
commands:
  primary <x> | leveraged <x> | position <x>   edit and commit an initial value
  pct <x>                                      set and tidy the percent input
  + | -                                        nudge the percent input by 1
  slide <x>                                    move the percent slider (-20..20)
  apply                                        apply the percent input
  undo                                         undo the last step
  batch <text>                                 set the batch input
  random                                       fill the batch input with a random batch
  apply-batch                                  apply the batch input
  set-initial | clear                          restart from the initial values
  show | chart | help | quit";

fn interactive_cmd(config: &SimConfig) -> Result<()> {
	let mut session = FormSession::new(config);
	println!("{HELP}\n");
	print_summary(session.engine());

	let stdin = io::stdin();
	let mut out = io::stdout();
	loop {
		write!(out, "> ")?;
		out.flush()?;

		let mut line = String::new();
		if stdin.lock().read_line(&mut line).context("reading command")? == 0 {
			break;
		}
		let line = line.trim();
		let (cmd, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
		let arg = arg.trim();

		match cmd {
			"" => continue,
			"quit" | "exit" => break,
			"help" => println!("{HELP}"),
			"primary" => commit_field(&mut session, Field::InitialPrimary, arg),
			"leveraged" => commit_field(&mut session, Field::InitialLeveraged, arg),
			"position" => commit_field(&mut session, Field::PositionSize, arg),
			"pct" => {
				session.pct_input = arg.to_string();
				session.commit_pct();
				println!("pct: {}", session.pct_input);
			}
			"+" | "-" => {
				let delta = if cmd == "+" { 1.0 } else { -1.0 };
				if session.nudge_pct(delta) {
					println!("pct: {}", session.pct_input);
				} else {
					println!("controls disabled");
				}
			}
			"slide" => match arg.parse::<f64>() {
				Ok(v) if session.slide_pct(v) => println!("pct: {}", session.pct_input),
				Ok(_) => println!("controls disabled"),
				Err(_) => println!("slide needs a number"),
			},
			"apply" => {
				let applied = session.apply_pct_input();
				report(&session, applied);
			}
			"undo" => {
				let undone = session.undo_last();
				report(&session, undone);
			}
			"batch" => session.batch_input = arg.to_string(),
			"random" => {
				if session.generate_random_batch() {
					println!("batch: {}", session.batch_input);
				} else {
					println!("controls disabled");
				}
			}
			"apply-batch" => {
				let n = session.apply_batch_input();
				println!("{n} step(s) applied");
				report(&session, n > 0);
			}
			"set-initial" => {
				session.set_as_initial();
				report(&session, true);
			}
			"clear" => {
				session.clear_history();
				report(&session, true);
			}
			"show" => {
				print_summary(session.engine());
				println!();
				print_history(session.engine());
			}
			"chart" => {
				for p in session.engine().chart_series() {
					println!("{:<24} {:>10} {:>10}", tooltip_label(&p), fmt_money(p.primary), fmt_money(p.leveraged));
				}
			}
			other => println!("unknown command '{other}', try 'help'"),
		}
	}
	Ok(())
}

fn commit_field(session: &mut FormSession, field: Field, text: &str) {
	session.edit(field, text);
	if !session.commit(field) {
		println!("not a number, kept {}", session.field(field).text());
	}
	if session.controls_disabled() {
		println!("controls disabled: initial values must be non-zero numbers");
	}
}

fn report(session: &FormSession, changed: bool) {
	if changed {
		print_summary(session.engine());
	} else if session.controls_disabled() {
		println!("controls disabled");
	} else {
		println!("nothing to do");
	}
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_summary(engine: &SimulationEngine) {
	println!(
		"Current TSLA {}   Current TSLL {}   Unrealized P/L (TSLL) {}",
		fmt_money(engine.current_primary()),
		fmt_money(engine.current_leveraged()),
		fmt_money(engine.current_profit())
	);
}

fn print_history(engine: &SimulationEngine) {
	let b = engine.baseline();
	println!("Step   Change %        TSLA        TSLL   Profit (TSLL)");
	println!("--------------------------------------------------------");
	println!("{}", history_row(0, None, b.primary, b.leveraged, 0.0));
	for s in engine.history() {
		println!(
			"{}",
			history_row(s.index, Some(s.percent_change), s.primary_price, s.leveraged_price, s.profit)
		);
	}
}

/// One table row; the baseline row has no change and shows the placeholder.
fn history_row(index: usize, change: Option<f64>, primary: f64, leveraged: f64, profit: f64) -> String {
	let change = change.map_or_else(|| fmt_opt(None), fmt_percent);
	format!(
		"{:<6} {:>8} {:>11} {:>11} {:>15}",
		index,
		change,
		fmt_money(primary),
		fmt_money(leveraged),
		fmt_money(profit)
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use leverage_sim::types::PLACEHOLDER;

	#[test]
	fn baseline_row_uses_the_placeholder() {
		let row = history_row(0, None, 100.0, 50.0, 0.0);
		let cells: Vec<&str> = row.split_whitespace().collect();
		assert_eq!(cells, vec!["0", PLACEHOLDER, "$100.00", "$50.00", "$0.00"]);
	}

	#[test]
	fn step_row_shows_the_change() {
		let row = history_row(1, Some(5.0), 105.0, 55.0, 50.0);
		assert_eq!(row.split_whitespace().nth(1), Some("5.00%"));
	}
}
