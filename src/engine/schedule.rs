//! Schedule output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::context::PeriodContext;
use crate::loan::Frequency;

/// One line of the amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Repayment period; 0 is the opening snapshot
    pub period: u32,
    /// Amount actually charged this period, fees included
    pub repayment: f64,
    /// Interest accrued on the offset-netted balance
    pub interest_paid: f64,
    /// Portion of the repayment that reduced the balance (or grew it,
    /// for savings runs)
    pub principal_paid: f64,
    /// Balance at the end of the period
    pub principal_balance: f64,
    /// Interest still to be paid over the rest of the schedule
    pub interest_balance: f64,
}

impl AmortizationRow {
    /// Row with every amount zeroed
    pub fn new(period: u32) -> Self {
        Self {
            period,
            repayment: 0.0,
            interest_paid: 0.0,
            principal_paid: 0.0,
            principal_balance: 0.0,
            interest_balance: 0.0,
        }
    }

    /// The period-0 snapshot: nothing paid, full balance outstanding
    pub fn initial(principal: f64) -> Self {
        Self {
            principal_balance: principal,
            ..Self::new(0)
        }
    }
}

/// Totals across the whole schedule
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoanTotals {
    /// Sum of reported repayments, fees included
    pub repayment: f64,
    /// Sum of interest accrued
    pub interest_paid: f64,
}

/// Complete output of one calculation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// Identifier carried through from the quote
    pub loan_id: u32,

    /// Period rows, starting with the period-0 snapshot
    pub rows: Vec<AmortizationRow>,

    /// Schedule-wide totals
    pub totals: LoanTotals,

    /// Per-period contexts, populated when the engine is configured
    /// to capture them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<PeriodContext>,
}

impl AmortizationResult {
    pub fn new(loan_id: u32) -> Self {
        Self {
            loan_id,
            rows: Vec::new(),
            totals: LoanTotals::default(),
            contexts: Vec::new(),
        }
    }

    /// Append a schedule row
    pub fn add_row(&mut self, row: AmortizationRow) {
        self.rows.push(row);
    }

    /// Number of repayment periods in the schedule; the opening
    /// snapshot is not counted
    pub fn periods(&self) -> u32 {
        self.rows.len().saturating_sub(1) as u32
    }

    /// Balance at the end of the schedule
    pub fn final_balance(&self) -> f64 {
        self.rows.last().map(|row| row.principal_balance).unwrap_or(0.0)
    }

    /// Compute totals and back-fill each row's remaining interest.
    /// Runs once, after the period loop.
    pub fn finalize(&mut self) {
        self.totals.repayment = self.rows.iter().map(|row| row.repayment).sum();
        self.totals.interest_paid = self.rows.iter().map(|row| row.interest_paid).sum();

        let mut remaining = self.totals.interest_paid;
        for row in &mut self.rows {
            remaining -= row.interest_paid;
            row.interest_balance = remaining;
        }
    }

    /// Payment date for each row, stepping from `start` at the given
    /// frequency. Dates label the schedule; interest never depends on
    /// them.
    pub fn payment_dates(&self, start: NaiveDate, frequency: Frequency) -> Vec<Option<NaiveDate>> {
        self.rows
            .iter()
            .map(|row| frequency.advance(start, row.period))
            .collect()
    }
}
