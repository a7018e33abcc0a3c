//! Time-ranged loan modifiers
//!
//! An operator is active over an inclusive window of repayment periods
//! and rewrites part of the period context: interest-rate overrides,
//! recurring extra repayments, one-off lump sums, offset balances and
//! fees. Registration order is priority order: when two operators set
//! the same field, the later registration wins. Fees are the exception
//! and accumulate instead.

use serde::{Deserialize, Serialize};

use crate::engine::PeriodContext;
use crate::error::LoanError;
use crate::loan::Frequency;
use crate::math;

/// Inclusive range of repayment periods an operator is active over
///
/// `end` of `None` keeps the operator active for the life of the loan.
/// Periods are 1-based; period 0 is the schedule's opening snapshot
/// and no operator ever touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: u32,
    pub end: Option<u32>,
}

impl PeriodWindow {
    /// Window covering `start` through `end` inclusive
    pub fn new(start: u32, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Window active for exactly one period
    pub fn single(period: u32) -> Self {
        Self {
            start: period,
            end: Some(period),
        }
    }

    /// Whether the window covers `period`
    pub fn contains(&self, period: u32) -> bool {
        period >= self.start && self.end.map_or(true, |end| period <= end)
    }

    fn validate(&self) -> Result<(), String> {
        if self.start == 0 {
            return Err("start period must be at least 1".to_string());
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(format!("start period {} is after end period {}", self.start, end));
            }
        }
        Ok(())
    }
}

impl Default for PeriodWindow {
    fn default() -> Self {
        Self { start: 1, end: None }
    }
}

/// What an operator does to the period context while active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Replace the loan's interest rate and its quoting basis
    InterestRate { rate: f64, frequency: Frequency },
    /// Recurring repayment on top of the scheduled one
    ExtraRepayment { amount: f64, frequency: Frequency },
    /// One-off payment in a single period
    LumpSum { amount: f64 },
    /// Balance that earns no interest, netted off the principal when
    /// interest accrues
    Offset { amount: f64 },
    /// Charge reported on top of the repayment; accumulates across
    /// every fee operator active in the same period
    Fee { amount: f64, frequency: Frequency },
}

impl OperatorKind {
    /// Short tag used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::InterestRate { .. } => "interest-rate",
            OperatorKind::ExtraRepayment { .. } => "extra-repayment",
            OperatorKind::LumpSum { .. } => "lump-sum",
            OperatorKind::Offset { .. } => "offset",
            OperatorKind::Fee { .. } => "fee",
        }
    }

    fn amount(&self) -> f64 {
        match self {
            OperatorKind::InterestRate { rate, .. } => *rate,
            OperatorKind::ExtraRepayment { amount, .. }
            | OperatorKind::LumpSum { amount }
            | OperatorKind::Offset { amount }
            | OperatorKind::Fee { amount, .. } => *amount,
        }
    }
}

/// A registered modifier: identity, activation window and behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    /// Monotonic registration id, used in diagnostics
    pub id: u64,
    /// Inclusive activation range
    pub window: PeriodWindow,
    pub kind: OperatorKind,
}

impl Operator {
    pub fn new(id: u64, window: PeriodWindow, kind: OperatorKind) -> Self {
        Self { id, window, kind }
    }

    /// Whether this operator is active at `period`
    pub fn applies_at(&self, period: u32) -> bool {
        self.window.contains(period)
    }

    /// Fold this operator into a period context
    ///
    /// Pure transformation: the context is consumed and the rewritten
    /// copy returned, so folding a chain of operators never aliases.
    pub fn apply(&self, mut ctx: PeriodContext) -> PeriodContext {
        match self.kind {
            OperatorKind::InterestRate { rate, frequency } => {
                ctx.interest_rate = rate;
                ctx.interest_rate_frequency = frequency;
                ctx.eff_interest_rate = math::eff_interest_rate(
                    rate,
                    frequency.periods_per_year(),
                    ctx.repayment_frequency.periods_per_year(),
                );
            }
            OperatorKind::ExtraRepayment { amount, frequency } => {
                ctx.eff_extra_repayment = math::eff_extra_repayment(
                    amount,
                    frequency.periods_per_year(),
                    ctx.repayment_frequency.periods_per_year(),
                );
            }
            OperatorKind::LumpSum { amount } => {
                ctx.lump_sum = amount;
            }
            OperatorKind::Offset { amount } => {
                ctx.offset = amount;
            }
            OperatorKind::Fee { amount, frequency } => {
                ctx.fee += amount * frequency.periods_per_year()
                    / ctx.repayment_frequency.periods_per_year();
            }
        }
        ctx
    }

    /// Check the window and amount; runs alongside loan validation
    /// before any schedule row is produced
    pub fn validate(&self) -> Result<(), LoanError> {
        if let Err(reason) = self.window.validate() {
            return Err(LoanError::InvalidOperator {
                id: self.id,
                kind: self.kind.name(),
                reason,
            });
        }
        let amount = self.kind.amount();
        if !amount.is_finite() || amount < 0.0 {
            return Err(LoanError::InvalidOperator {
                id: self.id,
                kind: self.kind.name(),
                reason: format!("amount must be finite and non-negative, got {}", amount),
            });
        }
        Ok(())
    }
}

/// Options for an interest-rate override registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestRateOptions {
    /// Overriding nominal rate
    pub interest_rate: f64,
    /// Basis the rate is quoted at; yearly when omitted
    pub interest_rate_frequency: Option<Frequency>,
    /// First active period; 1 when omitted
    pub start_period: Option<u32>,
    /// Last active period; open-ended when omitted
    pub end_period: Option<u32>,
}

/// Options for a recurring extra-repayment registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraRepaymentOptions {
    /// Recurring amount on top of the scheduled repayment
    pub extra_repayment: f64,
    /// Frequency the amount is quoted at; monthly when omitted
    pub extra_repayment_frequency: Option<Frequency>,
    pub start_period: Option<u32>,
    pub end_period: Option<u32>,
}

/// Options for a one-off lump-sum registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LumpSumOptions {
    /// One-off amount
    pub lump_sum: f64,
    /// Period the payment lands in
    pub period: u32,
}

/// Options for an offset-balance registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetOptions {
    /// Balance netted off the principal when interest accrues
    pub offset: f64,
    pub start_period: Option<u32>,
    pub end_period: Option<u32>,
}

/// Options for a fee registration
///
/// Registers up to two operators: an upfront charge that lands once in
/// period 1, and an ongoing charge over the given window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeOptions {
    /// Charged once in the first repayment period
    pub upfront_fee: Option<f64>,
    /// Recurring charge over the window below
    pub ongoing_fee: Option<f64>,
    /// Frequency the ongoing fee is quoted at; monthly when omitted
    pub ongoing_fee_frequency: Option<Frequency>,
    pub start_period: Option<u32>,
    pub end_period: Option<u32>,
}

/// Declarative operator description
///
/// The form scenario files, portfolio columns and the quote API use;
/// each variant carries the same options struct the corresponding
/// engine registration method takes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OperatorSpec {
    InterestRate(InterestRateOptions),
    ExtraRepayment(ExtraRepaymentOptions),
    LumpSum(LumpSumOptions),
    Offset(OffsetOptions),
    Fee(FeeOptions),
}
