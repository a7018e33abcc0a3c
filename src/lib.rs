//! Loan Engine - Amortization schedules with time-ranged modifiers
//!
//! This library provides:
//! - Full amortization schedules for principal-and-interest and
//!   interest-only loans at yearly through weekly frequencies
//! - Time-ranged operators: rate overrides, extra repayments, lump
//!   sums, offset balances and fees
//! - Payment-driven terms (solve the term from a repayment amount)
//! - A savings mode that accumulates a balance instead of amortizing it
//! - Portfolio loading and parallel scenario comparison

pub mod engine;
pub mod error;
pub mod loan;
pub mod math;
pub mod operator;
pub mod scenario;

// Re-export commonly used types
pub use engine::{AmortizationResult, AmortizationRow, EngineConfig, LoanEngine, LoanTotals, PeriodContext};
pub use error::LoanError;
pub use loan::{Frequency, Loan, RepaymentType};
pub use operator::{Operator, OperatorKind, OperatorSpec, PeriodWindow};
pub use scenario::{Scenario, ScenarioOutcome, ScenarioRunner};
