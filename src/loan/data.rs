//! Loan data structures for the amortization engine
//!
//! A [`Loan`] holds the quote exactly as given: amounts and frequencies
//! before any per-period normalization. Normalization happens once,
//! when the engine builds its base period context.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::LoanError;

/// Default basis for rates and terms
fn default_yearly() -> Frequency {
    Frequency::Year
}

/// Default repayment cadence
fn default_monthly() -> Frequency {
    Frequency::Month
}

/// Payment or compounding frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One period per year
    #[serde(alias = "yearly")]
    Year,
    /// Twelve periods per year
    #[serde(alias = "monthly")]
    Month,
    /// Twenty-six periods per year
    #[serde(alias = "fortnightly")]
    Fortnight,
    /// Fifty-two periods per year
    #[serde(alias = "weekly")]
    Week,
}

impl Frequency {
    /// Number of periods in a year
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Frequency::Year => 1.0,
            Frequency::Month => 12.0,
            Frequency::Fortnight => 26.0,
            Frequency::Week => 52.0,
        }
    }

    /// Step a date forward by `periods` payment intervals
    ///
    /// Monthly and yearly steps clamp to the end of shorter months,
    /// so a schedule anchored on the 31st stays on month-ends.
    pub fn advance(&self, date: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Year => date.checked_add_months(Months::new(12 * periods)),
            Frequency::Month => date.checked_add_months(Months::new(periods)),
            Frequency::Fortnight => date.checked_add_days(Days::new(14 * periods as u64)),
            Frequency::Week => date.checked_add_days(Days::new(7 * periods as u64)),
        }
    }
}

/// How repayments are applied to the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentType {
    /// Level payments covering interest plus principal
    PrincipalAndInterest,
    /// Payments cover accrued interest only; the balance never moves
    InterestOnly,
}

impl Default for RepaymentType {
    fn default() -> Self {
        RepaymentType::PrincipalAndInterest
    }
}

/// A loan as quoted
///
/// `term` of 0 with a positive `repayment` asks the engine to solve
/// the term from the payment. `repayment` of 0 with a positive `term`
/// asks it to derive the level payment. Setting both keeps the term
/// and reprices the payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Identifier carried through to results and reports
    #[serde(default)]
    pub loan_id: u32,

    /// Amount borrowed (or opening balance for savings runs)
    #[serde(default)]
    pub principal: f64,

    /// Nominal interest rate, e.g. 0.065 for 6.5%
    #[serde(default)]
    pub interest_rate: f64,

    /// Basis the rate is quoted at
    #[serde(default = "default_yearly")]
    pub interest_rate_frequency: Frequency,

    /// Loan term in `term_frequency` units; 0 means solve it from the
    /// repayment amount
    #[serde(default)]
    pub term: f64,

    /// Unit of `term`
    #[serde(default = "default_yearly")]
    pub term_frequency: Frequency,

    /// Caller-chosen repayment per period; 0 means derive it from the term
    #[serde(default)]
    pub repayment: f64,

    /// Principal-and-interest or interest-only
    #[serde(default)]
    pub repayment_type: RepaymentType,

    /// How often repayments are made
    #[serde(default = "default_monthly")]
    pub repayment_frequency: Frequency,
}

impl Default for Loan {
    fn default() -> Self {
        Self {
            loan_id: 0,
            principal: 0.0,
            interest_rate: 0.0,
            interest_rate_frequency: Frequency::Year,
            term: 0.0,
            term_frequency: Frequency::Year,
            repayment: 0.0,
            repayment_type: RepaymentType::PrincipalAndInterest,
            repayment_frequency: Frequency::Month,
        }
    }
}

impl Loan {
    /// Principal-and-interest loan with the common defaults: yearly
    /// rate, term in years, monthly repayments
    pub fn new(principal: f64, interest_rate: f64, term_years: f64) -> Self {
        Self {
            principal,
            interest_rate,
            term: term_years,
            ..Default::default()
        }
    }

    /// Interest-only variant of [`Loan::new`]
    pub fn interest_only(principal: f64, interest_rate: f64, term_years: f64) -> Self {
        Self {
            repayment_type: RepaymentType::InterestOnly,
            ..Self::new(principal, interest_rate, term_years)
        }
    }

    /// Check the quoted parameters before any schedule math runs
    pub fn validate(&self) -> Result<(), LoanError> {
        if !self.principal.is_finite() || self.principal < 0.0 {
            return Err(LoanError::invalid(
                "principal",
                format!("must be a finite non-negative amount, got {}", self.principal),
            ));
        }
        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            return Err(LoanError::invalid(
                "interest_rate",
                format!("must be a finite non-negative rate, got {}", self.interest_rate),
            ));
        }
        if !self.term.is_finite() || self.term < 0.0 {
            return Err(LoanError::invalid(
                "term",
                format!("must be a finite non-negative length, got {}", self.term),
            ));
        }
        if !self.repayment.is_finite() || self.repayment < 0.0 {
            return Err(LoanError::invalid(
                "repayment",
                format!("must be a finite non-negative amount, got {}", self.repayment),
            ));
        }
        if self.term == 0.0 && self.repayment == 0.0 {
            return Err(LoanError::invalid(
                "term",
                "term is 0 and no repayment was given to solve one from",
            ));
        }
        Ok(())
    }
}
