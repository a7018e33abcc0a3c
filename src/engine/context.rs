//! Per-period calculation context
//!
//! The base context normalizes the quoted loan once: effective rate,
//! effective term, and the payment-driven term solve. Each period the
//! engine rebases that context on the running balance and folds in the
//! operators active at that period.

use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::loan::{Frequency, Loan, RepaymentType};
use crate::math;
use crate::operator::Operator;

/// Inputs to one period of the amortization loop, after operator
/// application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodContext {
    /// Balance entering the period
    pub principal: f64,
    /// Nominal rate in force
    pub interest_rate: f64,
    /// Basis `interest_rate` is quoted at
    pub interest_rate_frequency: Frequency,
    /// Rate per repayment period
    pub eff_interest_rate: f64,
    /// Term in `term_frequency` units, solved when the quote had none
    pub term: f64,
    pub term_frequency: Frequency,
    /// Term in repayment periods; fractional for payment-driven quotes
    pub eff_term: f64,
    /// Scheduled repayment decided for the period, before extras
    pub repayment: f64,
    pub repayment_type: RepaymentType,
    pub repayment_frequency: Frequency,
    /// Recurring extra amount per repayment period
    pub eff_extra_repayment: f64,
    /// One-off amount for this period
    pub lump_sum: f64,
    /// Offset balance netted off when interest accrues
    pub offset: f64,
    /// Fees charged this period, reported on top of the repayment
    pub fee: f64,
}

impl PeriodContext {
    /// Normalize a quoted loan into the base context
    ///
    /// Validates the quote, derives the effective rate and term, and
    /// solves the term for payment-driven quotes. A repayment that
    /// cannot amortize the principal is rejected here, before any
    /// schedule row exists.
    pub fn from_loan(loan: &Loan) -> Result<Self, LoanError> {
        loan.validate()?;

        let repayment_periods = loan.repayment_frequency.periods_per_year();
        let eff_interest_rate = math::eff_interest_rate(
            loan.interest_rate,
            loan.interest_rate_frequency.periods_per_year(),
            repayment_periods,
        );

        let mut term = loan.term;
        if term == 0.0 {
            let periods = math::nper(loan.principal, eff_interest_rate, loan.repayment).ok_or(
                LoanError::InfeasibleRepayment {
                    repayment: loan.repayment,
                    principal: loan.principal,
                    periodic_interest: eff_interest_rate * loan.principal,
                },
            )?;
            term = periods / repayment_periods;
        }

        let eff_term = math::eff_term(
            term,
            loan.term_frequency.periods_per_year(),
            repayment_periods,
        );

        if !eff_interest_rate.is_finite() || !eff_term.is_finite() {
            return Err(LoanError::invalid(
                "loan",
                format!(
                    "normalization produced a non-finite value (rate {}, term {})",
                    eff_interest_rate, eff_term
                ),
            ));
        }

        Ok(Self {
            principal: loan.principal,
            interest_rate: loan.interest_rate,
            interest_rate_frequency: loan.interest_rate_frequency,
            eff_interest_rate,
            term,
            term_frequency: loan.term_frequency,
            eff_term,
            repayment: loan.repayment,
            repayment_type: loan.repayment_type,
            repayment_frequency: loan.repayment_frequency,
            eff_extra_repayment: 0.0,
            lump_sum: 0.0,
            offset: 0.0,
            fee: 0.0,
        })
    }

    /// Build the context for `period`: rebase on the running balance,
    /// then fold in every operator active at `period` in registration
    /// order
    pub fn build(
        period: u32,
        base: &PeriodContext,
        balance: f64,
        operators: &[Operator],
    ) -> PeriodContext {
        let mut ctx = base.clone();
        ctx.principal = balance;
        operators
            .iter()
            .filter(|op| op.applies_at(period))
            .fold(ctx, |acc, op| op.apply(acc))
    }
}
