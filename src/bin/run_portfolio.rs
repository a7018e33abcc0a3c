//! Run every loan in a portfolio CSV and aggregate the results
//!
//! Calculates all schedules in parallel, prints one line per loan plus
//! block totals, and writes the per-loan summary to CSV. A loan that
//! fails validation is reported and skipped; it never sinks the block.
//!
//! Usage: cargo run --release --bin run_portfolio -- portfolio.csv

use std::fs::File;
use std::io::Write;
use std::time::Instant;

use anyhow::Context;
use rayon::prelude::*;

use loan_engine::loan::{load_portfolio, LoanRecord};
use loan_engine::{AmortizationResult, EngineConfig, LoanError};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "portfolio.csv".to_string());

    let start = Instant::now();
    println!("Loading portfolio from {}...", path);

    let records: Vec<LoanRecord> = load_portfolio(&path)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("loading {}", path))?;
    println!("Loaded {} loans in {:?}", records.len(), start.elapsed());

    let calc_start = Instant::now();
    let results: Vec<Result<AmortizationResult, LoanError>> = records
        .par_iter()
        .map(|record| record.clone().into_engine(EngineConfig::default()).calculate())
        .collect();
    println!("Calculated {} schedules in {:?}\n", results.len(), calc_start.elapsed());

    println!(
        "{:>8} {:>8} {:>16} {:>16} {:>14}",
        "LoanID", "Periods", "Repayments", "Interest", "FinalBalance"
    );
    println!("{}", "-".repeat(66));

    let mut total_repayments = 0.0;
    let mut total_interest = 0.0;
    let mut failures = 0usize;

    for (record, result) in records.iter().zip(&results) {
        match result {
            Ok(res) => {
                total_repayments += res.totals.repayment;
                total_interest += res.totals.interest_paid;
                println!(
                    "{:>8} {:>8} {:>16.2} {:>16.2} {:>14.2}",
                    record.loan.loan_id,
                    res.periods(),
                    res.totals.repayment,
                    res.totals.interest_paid,
                    res.final_balance()
                );
            }
            Err(e) => {
                failures += 1;
                println!("{:>8} FAILED: {}", record.loan.loan_id, e);
            }
        }
    }

    println!("\nBlock Summary:");
    println!("  Loans: {} ({} failed)", records.len(), failures);
    println!("  Total Repayments: ${:.2}", total_repayments);
    println!("  Total Interest: ${:.2}", total_interest);

    let output_path = "portfolio_output.csv";
    let mut file = File::create(output_path).context("creating portfolio_output.csv")?;
    writeln!(file, "LoanID,Periods,TotalRepayment,TotalInterest,FinalBalance")?;
    for (record, result) in records.iter().zip(&results) {
        if let Ok(res) = result {
            writeln!(
                file,
                "{},{},{:.2},{:.2},{:.2}",
                record.loan.loan_id,
                res.periods(),
                res.totals.repayment,
                res.totals.interest_paid,
                res.final_balance()
            )?;
        }
    }
    println!("\nPer-loan summary written to: {}", output_path);

    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
