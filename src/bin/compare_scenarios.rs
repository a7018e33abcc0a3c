//! Compare operator scenarios for one loan
//!
//! Reads a JSON file holding a list of named scenarios, runs them all
//! against the base loan, and prints a comparison table with the
//! interest saved relative to the first scenario in the file.
//!
//! Usage: cargo run --bin compare_scenarios -- scenarios.json

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use loan_engine::scenario::{interest_saving, Scenario, ScenarioRunner};
use loan_engine::Loan;

#[derive(Debug, Parser)]
#[command(about = "Run named operator scenarios against one loan and compare totals")]
struct Args {
    /// JSON file with a list of scenarios
    scenarios: PathBuf,

    /// Amount borrowed
    #[arg(long, default_value_t = 100_000.0)]
    principal: f64,

    /// Yearly nominal interest rate
    #[arg(long, default_value_t = 0.1)]
    rate: f64,

    /// Term in years
    #[arg(long, default_value_t = 10.0)]
    term: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.scenarios)
        .with_context(|| format!("reading {}", args.scenarios.display()))?;
    let scenarios: Vec<Scenario> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.scenarios.display()))?;
    anyhow::ensure!(!scenarios.is_empty(), "no scenarios in {}", args.scenarios.display());

    let runner = ScenarioRunner::new(Loan::new(args.principal, args.rate, args.term));
    let outcomes = runner.run_all(&scenarios)?;

    println!(
        "Base loan: ${:.2} at {:.2}% p.a. over {} years\n",
        args.principal,
        args.rate * 100.0,
        args.term
    );

    println!(
        "{:<28} {:>8} {:>16} {:>16} {:>14}",
        "Scenario", "Periods", "Repayments", "Interest", "Saved"
    );
    println!("{}", "-".repeat(86));

    let baseline = &outcomes[0];
    for outcome in &outcomes {
        println!(
            "{:<28} {:>8} {:>16.2} {:>16.2} {:>14.2}",
            outcome.name,
            outcome.periods,
            outcome.totals.repayment,
            outcome.totals.interest_paid,
            interest_saving(baseline, outcome)
        );
    }

    Ok(())
}
