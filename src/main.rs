//! Loan Engine CLI
//!
//! Quote a single loan from the command line: print the schedule as a
//! table, optionally write the full schedule to CSV or dump the result
//! as JSON.

use chrono::NaiveDate;
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use loan_engine::operator::{
    ExtraRepaymentOptions, FeeOptions, InterestRateOptions, LumpSumOptions, OffsetOptions,
};
use loan_engine::{EngineConfig, Frequency, Loan, LoanEngine, RepaymentType};

#[derive(Debug, Parser)]
#[command(
    name = "loan_engine",
    about = "Amortization schedules with rate overrides, extra repayments, offsets and fees"
)]
struct Args {
    /// Amount borrowed
    #[arg(long, default_value_t = 100_000.0)]
    principal: f64,

    /// Yearly nominal interest rate (0.1 = 10%)
    #[arg(long, default_value_t = 0.1)]
    rate: f64,

    /// Term in years; 0 solves the term from --repayment
    #[arg(long, default_value_t = 10.0)]
    term: f64,

    /// Repayment per period; used when --term is 0
    #[arg(long, default_value_t = 0.0)]
    repayment: f64,

    /// Repayment frequency: yearly, monthly, fortnightly or weekly
    #[arg(long, default_value = "monthly")]
    frequency: String,

    /// Interest-only instead of principal-and-interest
    #[arg(long)]
    interest_only: bool,

    /// Savings mode: accumulate the balance instead of amortizing it
    #[arg(long)]
    savings: bool,

    /// Offset balance held against the loan
    #[arg(long)]
    offset: Option<f64>,

    /// Recurring extra repayment (monthly)
    #[arg(long)]
    extra_repayment: Option<f64>,

    /// First period the extra repayment applies from
    #[arg(long, default_value_t = 1)]
    extra_from: u32,

    /// One-off lump sum amount
    #[arg(long)]
    lump_sum: Option<f64>,

    /// Period the lump sum lands in
    #[arg(long, default_value_t = 1)]
    lump_sum_period: u32,

    /// Introductory rate override
    #[arg(long)]
    intro_rate: Option<f64>,

    /// Length of the introductory window in periods
    #[arg(long, default_value_t = 12)]
    intro_periods: u32,

    /// Upfront fee charged in period 1
    #[arg(long)]
    upfront_fee: Option<f64>,

    /// Ongoing monthly fee
    #[arg(long)]
    ongoing_fee: Option<f64>,

    /// First payment date, used to label schedule rows
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Schedule rows to print
    #[arg(long, default_value_t = 12)]
    rows: usize,

    /// Write the full schedule to a CSV file
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let repayment_frequency = match args.frequency.as_str() {
        "yearly" => Frequency::Year,
        "monthly" => Frequency::Month,
        "fortnightly" => Frequency::Fortnight,
        "weekly" => Frequency::Week,
        other => anyhow::bail!(
            "unknown frequency '{}' (expected yearly, monthly, fortnightly or weekly)",
            other
        ),
    };

    let loan = Loan {
        principal: args.principal,
        interest_rate: args.rate,
        term: args.term,
        repayment: args.repayment,
        repayment_type: if args.interest_only {
            RepaymentType::InterestOnly
        } else {
            RepaymentType::PrincipalAndInterest
        },
        repayment_frequency,
        ..Default::default()
    };

    let config = EngineConfig {
        savings_mode: args.savings,
        ..Default::default()
    };
    let mut engine = LoanEngine::new(loan).with_config(config);

    if let Some(rate) = args.intro_rate {
        engine = engine.interest_rate(InterestRateOptions {
            interest_rate: rate,
            end_period: Some(args.intro_periods),
            ..Default::default()
        });
    }
    if let Some(amount) = args.extra_repayment {
        engine = engine.extra_repayment(ExtraRepaymentOptions {
            extra_repayment: amount,
            start_period: Some(args.extra_from),
            ..Default::default()
        });
    }
    if let Some(amount) = args.lump_sum {
        engine = engine.lump_sum(LumpSumOptions {
            lump_sum: amount,
            period: args.lump_sum_period,
        });
    }
    if let Some(amount) = args.offset {
        engine = engine.offset(OffsetOptions {
            offset: amount,
            ..Default::default()
        });
    }
    if args.upfront_fee.is_some() || args.ongoing_fee.is_some() {
        engine = engine.fee(FeeOptions {
            upfront_fee: args.upfront_fee,
            ongoing_fee: args.ongoing_fee,
            ..Default::default()
        });
    }

    let result = engine.calculate()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let dates = args
        .start_date
        .map(|start| result.payment_dates(start, repayment_frequency));

    println!("Loan Engine v0.1.0");
    println!("==================\n");

    println!("Principal: ${:.2}", args.principal);
    println!("Rate: {:.2}% p.a.", args.rate * 100.0);
    if args.savings {
        println!("Mode: savings");
    } else {
        println!(
            "Mode: {}",
            if args.interest_only { "interest-only" } else { "principal-and-interest" }
        );
    }
    println!("Periods: {}\n", result.periods());

    println!(
        "{:>6} {:>12} {:>14} {:>14} {:>14} {:>16} {:>16}",
        "Period", "Date", "Repayment", "Interest", "Principal", "Balance", "InterestLeft"
    );
    println!("{}", "-".repeat(98));

    for row in result.rows.iter().take(args.rows + 1) {
        let date = dates
            .as_ref()
            .and_then(|all| all.get(row.period as usize).copied().flatten())
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6} {:>12} {:>14.2} {:>14.2} {:>14.2} {:>16.2} {:>16.2}",
            row.period,
            date,
            row.repayment,
            row.interest_paid,
            row.principal_paid,
            row.principal_balance,
            row.interest_balance
        );
    }

    if result.rows.len() > args.rows + 1 {
        println!("... ({} more periods)", result.rows.len() - args.rows - 1);
    }

    println!("\nTotals:");
    println!("  Repayments: ${:.2}", result.totals.repayment);
    println!("  Interest:   ${:.2}", result.totals.interest_paid);
    println!("  Final Balance: ${:.2}", result.final_balance());

    if let Some(path) = args.csv_out {
        let mut file =
            File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        writeln!(
            file,
            "Period,Repayment,InterestPaid,PrincipalPaid,PrincipalBalance,InterestBalance"
        )?;
        for row in &result.rows {
            writeln!(
                file,
                "{},{:.8},{:.8},{:.8},{:.8},{:.8}",
                row.period,
                row.repayment,
                row.interest_paid,
                row.principal_paid,
                row.principal_balance,
                row.interest_balance
            )?;
        }
        println!("\nFull schedule written to: {}", path.display());
    }

    Ok(())
}
