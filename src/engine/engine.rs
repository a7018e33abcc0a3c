//! Amortization engine
//!
//! Drives the period loop: build a context, decide the scheduled
//! repayment, apply the amortization step, emit a row, carry the
//! balance forward. Operators are registered up front; validation of
//! the loan and every operator happens before the first row exists.

use log::debug;
use serde::{Deserialize, Serialize};

use super::context::PeriodContext;
use super::schedule::{AmortizationResult, AmortizationRow};
use crate::error::LoanError;
use crate::loan::{Frequency, Loan, RepaymentType};
use crate::math;
use crate::operator::{
    ExtraRepaymentOptions, FeeOptions, InterestRateOptions, LumpSumOptions, OffsetOptions,
    Operator, OperatorKind, OperatorSpec, PeriodWindow,
};

/// Configuration for a calculation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accumulate the balance instead of amortizing it: repayments are
    /// deposits, the schedule runs the full term and the repayment is
    /// never recomputed
    pub savings_mode: bool,

    /// Keep the built per-period contexts on the result
    pub capture_contexts: bool,
}

/// Loan amortization engine
///
/// Owns the quoted loan, the run configuration and the registered
/// operators. Registration methods consume and return the engine so a
/// setup reads as a chain; `calculate` borrows, so one engine can run
/// any number of times with identical results.
#[derive(Debug, Clone)]
pub struct LoanEngine {
    loan: Loan,
    config: EngineConfig,
    operators: Vec<Operator>,
    next_operator_id: u64,
}

impl LoanEngine {
    /// Engine for a quoted loan with the default configuration
    pub fn new(loan: Loan) -> Self {
        Self {
            loan,
            config: EngineConfig::default(),
            operators: Vec::new(),
            next_operator_id: 1,
        }
    }

    /// Replace the run configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn loan(&self) -> &Loan {
        &self.loan
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Registered operators in priority (registration) order
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn push_operator(&mut self, window: PeriodWindow, kind: OperatorKind) {
        let id = self.next_operator_id;
        self.next_operator_id += 1;
        self.operators.push(Operator::new(id, window, kind));
    }

    /// Override the interest rate over a period window
    pub fn interest_rate(mut self, options: InterestRateOptions) -> Self {
        let window = PeriodWindow::new(options.start_period.unwrap_or(1), options.end_period);
        self.push_operator(
            window,
            OperatorKind::InterestRate {
                rate: options.interest_rate,
                frequency: options.interest_rate_frequency.unwrap_or(Frequency::Year),
            },
        );
        self
    }

    /// Add a recurring extra repayment
    pub fn extra_repayment(mut self, options: ExtraRepaymentOptions) -> Self {
        let window = PeriodWindow::new(options.start_period.unwrap_or(1), options.end_period);
        self.push_operator(
            window,
            OperatorKind::ExtraRepayment {
                amount: options.extra_repayment,
                frequency: options.extra_repayment_frequency.unwrap_or(Frequency::Month),
            },
        );
        self
    }

    /// Add a one-off lump sum
    pub fn lump_sum(mut self, options: LumpSumOptions) -> Self {
        self.push_operator(
            PeriodWindow::single(options.period),
            OperatorKind::LumpSum {
                amount: options.lump_sum,
            },
        );
        self
    }

    /// Hold an offset balance against the loan
    pub fn offset(mut self, options: OffsetOptions) -> Self {
        let window = PeriodWindow::new(options.start_period.unwrap_or(1), options.end_period);
        self.push_operator(window, OperatorKind::Offset { amount: options.offset });
        self
    }

    /// Add loan fees: an upfront charge in period 1 and/or an ongoing
    /// charge over the given window
    pub fn fee(mut self, options: FeeOptions) -> Self {
        if let Some(amount) = options.upfront_fee {
            // quoted per repayment period so exactly the nominal
            // amount lands in period 1
            let frequency = self.loan.repayment_frequency;
            self.push_operator(PeriodWindow::single(1), OperatorKind::Fee { amount, frequency });
        }
        if let Some(amount) = options.ongoing_fee {
            let window = PeriodWindow::new(options.start_period.unwrap_or(1), options.end_period);
            self.push_operator(
                window,
                OperatorKind::Fee {
                    amount,
                    frequency: options.ongoing_fee_frequency.unwrap_or(Frequency::Month),
                },
            );
        }
        self
    }

    /// Register an operator from its declarative form
    pub fn operator_spec(self, spec: &OperatorSpec) -> Self {
        match spec {
            OperatorSpec::InterestRate(options) => self.interest_rate(options.clone()),
            OperatorSpec::ExtraRepayment(options) => self.extra_repayment(options.clone()),
            OperatorSpec::LumpSum(options) => self.lump_sum(options.clone()),
            OperatorSpec::Offset(options) => self.offset(options.clone()),
            OperatorSpec::Fee(options) => self.fee(options.clone()),
        }
    }

    /// Run the amortization loop and produce the full schedule
    ///
    /// The loan, the solved term and every operator are validated
    /// before the opening row is emitted. Amortizing schedules stop
    /// early once the balance reaches zero; savings runs always cover
    /// the full term.
    pub fn calculate(&self) -> Result<AmortizationResult, LoanError> {
        let base = PeriodContext::from_loan(&self.loan)?;
        for op in &self.operators {
            op.validate()?;
        }

        let mut result = AmortizationResult::new(self.loan.loan_id);
        result.add_row(AmortizationRow::initial(base.principal));

        let mut balance = base.principal;
        let mut prev_rate = base.eff_interest_rate;
        let mut prev_repayment = 0.0;

        let mut period: u32 = 1;
        while (period as f64) <= base.eff_term {
            let mut ctx = PeriodContext::build(period, &base, balance, &self.operators);

            let repayment = self.decide_repayment(period, &ctx, prev_rate, prev_repayment);
            ctx.repayment = repayment;

            let row = self.amortize(period, &ctx);

            balance = row.principal_balance;
            prev_rate = ctx.eff_interest_rate;
            prev_repayment = repayment;

            let paid_out = !self.config.savings_mode && balance <= 0.0;

            if self.config.capture_contexts {
                result.contexts.push(ctx);
            }
            result.add_row(row);

            if paid_out {
                debug!("loan {} paid out at period {}", self.loan.loan_id, period);
                break;
            }
            period += 1;
        }

        result.finalize();
        Ok(result)
    }

    /// Decide this period's scheduled repayment
    ///
    /// The previous repayment is reused unless this is the first
    /// period, the effective rate changed, or no repayment has been
    /// decided yet. Savings runs always take the context's repayment
    /// as given.
    fn decide_repayment(
        &self,
        period: u32,
        ctx: &PeriodContext,
        prev_rate: f64,
        prev_repayment: f64,
    ) -> f64 {
        if self.config.savings_mode {
            return ctx.repayment;
        }

        let rate_changed = ctx.eff_interest_rate != prev_rate;
        if period == 1 || rate_changed || prev_repayment == 0.0 {
            if rate_changed {
                debug!(
                    "loan {}: repricing at period {} (rate {} -> {})",
                    self.loan.loan_id, period, prev_rate, ctx.eff_interest_rate
                );
            }
            let remaining = ctx.eff_term - period as f64 + 1.0;
            match ctx.repayment_type {
                RepaymentType::InterestOnly => ctx.principal * ctx.eff_interest_rate,
                RepaymentType::PrincipalAndInterest => {
                    math::pmt(ctx.principal, ctx.eff_interest_rate, remaining)
                }
            }
        } else {
            prev_repayment
        }
    }

    /// One amortization step: accrue interest on the offset-netted
    /// balance, apply the augmented repayment, report fees on top
    fn amortize(&self, period: u32, ctx: &PeriodContext) -> AmortizationRow {
        let mut repayment = ctx.repayment + ctx.eff_extra_repayment + ctx.lump_sum;

        let considered_principal = ctx.principal - ctx.offset;
        let interest_paid = (considered_principal * ctx.eff_interest_rate).max(0.0);

        let mut row = AmortizationRow::new(period);
        row.interest_paid = interest_paid;

        if self.config.savings_mode {
            row.principal_paid = repayment;
            row.principal_balance = ctx.principal + repayment + interest_paid;
        } else {
            // final-period clamp: never pay back more than is owed
            if repayment > ctx.principal {
                repayment = ctx.principal + interest_paid;
            }
            row.principal_paid = repayment - interest_paid;
            row.principal_balance = ctx.principal - row.principal_paid;
        }

        row.repayment = repayment + ctx.fee;
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn test_loan() -> Loan {
        Loan::new(100_000.0, 0.1, 10.0)
    }

    fn capturing() -> EngineConfig {
        EngineConfig {
            capture_contexts: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_schedule_runs_to_term() {
        let result = LoanEngine::new(test_loan()).calculate().expect("calculation failed");
        // opening snapshot plus 120 repayment periods
        assert_eq!(result.rows.len(), 121);
        assert_abs_diff_eq!(result.final_balance(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_opening_row_is_zero_except_balance() {
        let result = LoanEngine::new(test_loan()).calculate().unwrap();
        let first = &result.rows[0];
        assert_eq!(first.period, 0);
        assert_abs_diff_eq!(first.principal_balance, 100_000.0);
        assert_eq!(first.repayment, 0.0);
        assert_eq!(first.interest_paid, 0.0);
        assert_eq!(first.principal_paid, 0.0);
    }

    #[test]
    fn test_repayment_reused_while_rate_unchanged() {
        let result = LoanEngine::new(test_loan())
            .with_config(capturing())
            .calculate()
            .unwrap();

        let first = result.contexts[0].repayment;
        assert!(first > 0.0);
        assert!(result.contexts.iter().all(|ctx| ctx.repayment == first));
    }

    #[test]
    fn test_rate_override_reprices_exactly_once() {
        let result = LoanEngine::new(test_loan())
            .with_config(capturing())
            .interest_rate(InterestRateOptions {
                interest_rate: 0.15,
                end_period: Some(12),
                ..Default::default()
            })
            .calculate()
            .unwrap();

        let intro = result.contexts[0].repayment;
        let ongoing = result.contexts[12].repayment;
        assert!(intro > ongoing);
        assert!(result.contexts[..12].iter().all(|ctx| ctx.repayment == intro));
        assert!(result.contexts[12..].iter().all(|ctx| ctx.repayment == ongoing));
    }

    #[test]
    fn test_interest_only_balance_never_moves() {
        let loan = Loan::interest_only(100_000.0, 0.15, 10.0);
        let result = LoanEngine::new(loan).calculate().unwrap();
        assert_eq!(result.rows.len(), 121);
        assert!(result.rows.iter().all(|row| row.principal_balance == 100_000.0));

        let last = result.rows.last().unwrap();
        assert_abs_diff_eq!(last.repayment, 1_250.0, epsilon = 1e-9);
        assert_abs_diff_eq!(last.principal_paid, 0.0);
    }

    #[test]
    fn test_lump_sum_pays_down_extra_principal() {
        let baseline = LoanEngine::new(test_loan()).calculate().unwrap();
        let with_lump = LoanEngine::new(test_loan())
            .lump_sum(LumpSumOptions {
                lump_sum: 10_000.0,
                period: 12,
            })
            .calculate()
            .unwrap();

        // the one-off lands entirely in period 12
        assert_abs_diff_eq!(
            with_lump.rows[12].principal_paid - baseline.rows[12].principal_paid,
            10_000.0,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            with_lump.rows[11].repayment,
            baseline.rows[11].repayment,
            epsilon = 1e-9
        );
        assert!(with_lump.periods() < baseline.periods());
    }

    #[test]
    fn test_offset_reduces_interest_not_repayments() {
        let baseline = LoanEngine::new(test_loan()).calculate().unwrap();
        let with_offset = LoanEngine::new(test_loan())
            .offset(OffsetOptions {
                offset: 10_000.0,
                ..Default::default()
            })
            .calculate()
            .unwrap();

        assert!(with_offset.totals.interest_paid < baseline.totals.interest_paid);
        // the scheduled repayment is untouched; the balance just falls faster
        assert_abs_diff_eq!(
            with_offset.rows[1].repayment,
            baseline.rows[1].repayment,
            epsilon = 1e-9
        );
        assert!(with_offset.periods() < baseline.periods());
    }

    #[test]
    fn test_fully_offset_loan_accrues_no_interest() {
        let result = LoanEngine::new(test_loan())
            .offset(OffsetOptions {
                offset: 200_000.0,
                ..Default::default()
            })
            .calculate()
            .unwrap();
        assert_eq!(result.totals.interest_paid, 0.0);
        assert_abs_diff_eq!(result.final_balance(), 0.0);
    }

    #[test]
    fn test_savings_mode_accumulates() {
        let mut loan = Loan::new(500.0, 0.1, 10.0);
        loan.repayment = 100.0;
        let config = EngineConfig {
            savings_mode: true,
            ..Default::default()
        };
        let result = LoanEngine::new(loan).with_config(config).calculate().unwrap();

        assert_eq!(result.periods(), 120);
        assert_abs_diff_eq!(result.totals.repayment, 12_000.0, epsilon = 1e-6);
        let last = result.rows.last().unwrap();
        assert!(last.principal_balance > 500.0 + 12_000.0);
    }

    #[test]
    fn test_upfront_fee_lands_in_period_one_only() {
        let baseline = LoanEngine::new(test_loan()).calculate().unwrap();
        let result = LoanEngine::new(test_loan())
            .fee(FeeOptions {
                upfront_fee: Some(600.0),
                ..Default::default()
            })
            .calculate()
            .unwrap();

        assert_abs_diff_eq!(
            result.rows[1].repayment - baseline.rows[1].repayment,
            600.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(result.rows[2].repayment, baseline.rows[2].repayment, epsilon = 1e-9);
        // fees are reported, never amortized
        assert_abs_diff_eq!(
            result.rows[1].principal_paid,
            baseline.rows[1].principal_paid,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            result.final_balance(),
            baseline.final_balance(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ongoing_fee_covers_its_window() {
        let baseline = LoanEngine::new(test_loan()).calculate().unwrap();
        let result = LoanEngine::new(test_loan())
            .fee(FeeOptions {
                ongoing_fee: Some(10.0),
                start_period: Some(2),
                end_period: Some(3),
                ..Default::default()
            })
            .calculate()
            .unwrap();

        assert_abs_diff_eq!(result.rows[1].repayment, baseline.rows[1].repayment, epsilon = 1e-9);
        assert_abs_diff_eq!(
            result.rows[2].repayment - baseline.rows[2].repayment,
            10.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            result.rows[3].repayment - baseline.rows[3].repayment,
            10.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(result.rows[4].repayment, baseline.rows[4].repayment, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_loan_rejected_before_any_rows() {
        let result = LoanEngine::new(Loan::new(-5.0, 0.1, 10.0)).calculate();
        assert!(matches!(result, Err(LoanError::InvalidInput { .. })));
    }

    #[test]
    fn test_invalid_operator_rejected() {
        let engine = LoanEngine::new(test_loan()).extra_repayment(ExtraRepaymentOptions {
            extra_repayment: 100.0,
            start_period: Some(20),
            end_period: Some(10),
            ..Default::default()
        });
        assert!(matches!(engine.calculate(), Err(LoanError::InvalidOperator { .. })));
    }

    #[test]
    fn test_calculate_is_repeatable() {
        let engine = LoanEngine::new(test_loan()).extra_repayment(ExtraRepaymentOptions {
            extra_repayment: 100.0,
            ..Default::default()
        });
        let a = engine.calculate().unwrap();
        let b = engine.calculate().unwrap();
        assert_eq!(a.rows.len(), b.rows.len());
        assert_eq!(a.totals.repayment.to_bits(), b.totals.repayment.to_bits());
        assert_eq!(a.totals.interest_paid.to_bits(), b.totals.interest_paid.to_bits());
    }

    #[test]
    fn test_operator_ids_are_monotonic() {
        let engine = LoanEngine::new(test_loan())
            .offset(OffsetOptions {
                offset: 1_000.0,
                ..Default::default()
            })
            .lump_sum(LumpSumOptions {
                lump_sum: 500.0,
                period: 6,
            });
        let ids: Vec<u64> = engine.operators().iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
