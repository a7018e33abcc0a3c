//! Error types for loan calculations
//!
//! Everything here is surfaced before the amortization loop emits a
//! single row: bad quote parameters, repayments that can never
//! amortize the balance, and operators registered with unusable
//! windows or amounts.

use thiserror::Error;

/// Errors produced by loan validation and normalization
#[derive(Debug, Clone, Error)]
pub enum LoanError {
    /// A quoted loan parameter failed validation
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// A payment-driven quote whose repayment does not cover the
    /// periodic interest, so no finite term exists
    #[error("repayment {repayment:.2} cannot amortize principal {principal:.2}: periodic interest alone is {periodic_interest:.2}")]
    InfeasibleRepayment {
        repayment: f64,
        principal: f64,
        periodic_interest: f64,
    },

    /// An operator was registered with an unusable window or amount
    #[error("{kind} operator {id}: {reason}")]
    InvalidOperator {
        id: u64,
        kind: &'static str,
        reason: String,
    },
}

impl LoanError {
    /// Shorthand for [`LoanError::InvalidInput`]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
