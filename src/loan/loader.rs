//! Portfolio loading from CSV files
//!
//! One row per loan, with optional modifier columns (offset, extra
//! repayment, lump sum, fees) that become operator specs on the
//! record. Frequencies use the adverb vocabulary: yearly, monthly,
//! fortnightly, weekly.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use csv::Reader;

use crate::engine::{EngineConfig, LoanEngine};
use crate::operator::{
    ExtraRepaymentOptions, FeeOptions, LumpSumOptions, OffsetOptions, OperatorSpec,
};

use super::{Frequency, Loan, RepaymentType};

/// A portfolio line: the loan plus its modifier columns expressed as
/// operator specs
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub loan: Loan,
    pub modifiers: Vec<OperatorSpec>,
}

impl LoanRecord {
    /// Build a ready-to-run engine from this record
    pub fn into_engine(self, config: EngineConfig) -> LoanEngine {
        let mut engine = LoanEngine::new(self.loan).with_config(config);
        for spec in &self.modifiers {
            engine = engine.operator_spec(spec);
        }
        engine
    }
}

/// Raw CSV row matching the portfolio file headers
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanID")]
    loan_id: u32,
    #[serde(rename = "Principal")]
    principal: f64,
    #[serde(rename = "InterestRate")]
    interest_rate: f64,
    #[serde(rename = "Term")]
    term: f64,
    #[serde(rename = "RepaymentType")]
    repayment_type: String,
    #[serde(rename = "RepaymentFrequency")]
    repayment_frequency: String,
    #[serde(rename = "Repayment", default)]
    repayment: f64,
    #[serde(rename = "Offset", default)]
    offset: f64,
    #[serde(rename = "ExtraRepayment", default)]
    extra_repayment: f64,
    #[serde(rename = "ExtraRepaymentStart", default)]
    extra_repayment_start: u32,
    #[serde(rename = "LumpSum", default)]
    lump_sum: f64,
    #[serde(rename = "LumpSumPeriod", default)]
    lump_sum_period: u32,
    #[serde(rename = "UpfrontFee", default)]
    upfront_fee: f64,
    #[serde(rename = "OngoingFee", default)]
    ongoing_fee: f64,
}

impl CsvRow {
    fn to_record(self) -> Result<LoanRecord, Box<dyn Error>> {
        let repayment_type = match self.repayment_type.as_str() {
            "PI" | "P&I" => RepaymentType::PrincipalAndInterest,
            "IO" => RepaymentType::InterestOnly,
            other => return Err(format!("Unknown RepaymentType: {}", other).into()),
        };

        let repayment_frequency = match self.repayment_frequency.as_str() {
            "yearly" => Frequency::Year,
            "monthly" => Frequency::Month,
            "fortnightly" => Frequency::Fortnight,
            "weekly" => Frequency::Week,
            other => return Err(format!("Unknown RepaymentFrequency: {}", other).into()),
        };

        let loan = Loan {
            loan_id: self.loan_id,
            principal: self.principal,
            interest_rate: self.interest_rate,
            term: self.term,
            repayment: self.repayment,
            repayment_type,
            repayment_frequency,
            ..Default::default()
        };

        let mut modifiers = Vec::new();
        if self.offset > 0.0 {
            modifiers.push(OperatorSpec::Offset(OffsetOptions {
                offset: self.offset,
                ..Default::default()
            }));
        }
        if self.extra_repayment > 0.0 {
            modifiers.push(OperatorSpec::ExtraRepayment(ExtraRepaymentOptions {
                extra_repayment: self.extra_repayment,
                start_period: Some(self.extra_repayment_start.max(1)),
                ..Default::default()
            }));
        }
        if self.lump_sum > 0.0 {
            if self.lump_sum_period == 0 {
                return Err(format!(
                    "Loan {}: LumpSum requires a LumpSumPeriod",
                    self.loan_id
                )
                .into());
            }
            modifiers.push(OperatorSpec::LumpSum(LumpSumOptions {
                lump_sum: self.lump_sum,
                period: self.lump_sum_period,
            }));
        }
        if self.upfront_fee > 0.0 || self.ongoing_fee > 0.0 {
            modifiers.push(OperatorSpec::Fee(FeeOptions {
                upfront_fee: if self.upfront_fee > 0.0 {
                    Some(self.upfront_fee)
                } else {
                    None
                },
                ongoing_fee: if self.ongoing_fee > 0.0 {
                    Some(self.ongoing_fee)
                } else {
                    None
                },
                ..Default::default()
            }));
        }

        Ok(LoanRecord { loan, modifiers })
    }
}

/// Load a loan portfolio from a CSV file
pub fn load_portfolio<P: AsRef<Path>>(path: P) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let file = File::open(path)?;
    load_portfolio_from_reader(file)
}

/// Load a loan portfolio from any reader
pub fn load_portfolio_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize() {
        let row: CsvRow = row?;
        records.push(row.to_record()?);
    }

    Ok(records)
}
