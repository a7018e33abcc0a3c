//! Property-based invariant tests for the amortization engine

use loan_engine::operator::ExtraRepaymentOptions;
use loan_engine::{Loan, LoanEngine};
use proptest::prelude::*;

fn arb_loan() -> impl Strategy<Value = Loan> {
    (1_000.0f64..500_000.0, 0.0f64..0.25, 1.0f64..30.0).prop_map(
        |(principal, rate, term_years)| Loan::new(principal, rate, term_years.round()),
    )
}

proptest! {
    // An amortizing loan pays back exactly what was borrowed.
    #[test]
    fn principal_paid_sums_to_principal(loan in arb_loan()) {
        let principal = loan.principal;
        let result = LoanEngine::new(loan).calculate().unwrap();
        let paid: f64 = result.rows.iter().map(|row| row.principal_paid).sum();
        prop_assert!((paid - principal).abs() < 1e-6 * principal);
    }

    // Every repayment splits into interest plus principal, so the
    // totals decompose the same way.
    #[test]
    fn repayments_decompose_into_interest_and_principal(loan in arb_loan()) {
        let result = LoanEngine::new(loan).calculate().unwrap();
        let principal_paid: f64 = result.rows.iter().map(|row| row.principal_paid).sum();
        let expected = result.totals.interest_paid + principal_paid;
        prop_assert!((result.totals.repayment - expected).abs() < 1e-5);
    }

    // The schedule never runs past the term (plus the opening snapshot).
    #[test]
    fn schedule_length_bounded_by_term(loan in arb_loan()) {
        let term_periods = (loan.term * 12.0).round() as usize;
        let result = LoanEngine::new(loan).calculate().unwrap();
        prop_assert!(result.rows.len() <= term_periods + 1);
    }

    // Balances never go meaningfully negative on an amortizing
    // schedule; the final clamped payment can undershoot by rounding
    // only.
    #[test]
    fn balance_never_negative(loan in arb_loan()) {
        let result = LoanEngine::new(loan).calculate().unwrap();
        prop_assert!(result.rows.iter().all(|row| row.principal_balance >= -1e-9));
    }

    // Same inputs, same bits: run twice and compare.
    #[test]
    fn calculation_is_deterministic(loan in arb_loan()) {
        let engine = LoanEngine::new(loan);
        let a = engine.calculate().unwrap();
        let b = engine.calculate().unwrap();
        prop_assert_eq!(a.rows.len(), b.rows.len());
        prop_assert_eq!(a.totals.repayment.to_bits(), b.totals.repayment.to_bits());
        prop_assert_eq!(a.totals.interest_paid.to_bits(), b.totals.interest_paid.to_bits());
    }

    // Paying extra never increases the interest bill.
    #[test]
    fn extra_repayments_never_cost_interest(loan in arb_loan(), extra in 1.0f64..500.0) {
        let baseline = LoanEngine::new(loan.clone()).calculate().unwrap();
        let result = LoanEngine::new(loan)
            .extra_repayment(ExtraRepaymentOptions {
                extra_repayment: extra,
                ..Default::default()
            })
            .calculate()
            .unwrap();
        prop_assert!(result.totals.interest_paid <= baseline.totals.interest_paid + 1e-9);
    }
}
