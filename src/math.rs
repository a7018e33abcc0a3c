//! Financial math primitives
//!
//! Closed-form annuity formulas plus the frequency conversions the
//! engine and operators share. Everything works on per-period
//! quantities; callers normalize once and stay in period space.

/// Convert a nominal interest rate to its per-repayment-period rate.
///
/// # Arguments
/// * `rate` - Nominal rate, e.g. 0.065 for 6.5%
/// * `rate_frequency` - Compounding periods per year the rate is quoted at
/// * `repayment_frequency` - Repayment periods per year
pub fn eff_interest_rate(rate: f64, rate_frequency: f64, repayment_frequency: f64) -> f64 {
    rate * rate_frequency / repayment_frequency
}

/// Convert a term to a count of repayment periods. May be fractional
/// for payment-driven quotes.
pub fn eff_term(term: f64, term_frequency: f64, repayment_frequency: f64) -> f64 {
    term / term_frequency * repayment_frequency
}

/// Convert a recurring amount quoted at one frequency to its
/// per-repayment-period equivalent.
pub fn eff_extra_repayment(amount: f64, amount_frequency: f64, repayment_frequency: f64) -> f64 {
    amount * amount_frequency / repayment_frequency
}

/// Level payment that amortizes `present_value` over `periods` at
/// `rate` per period.
///
/// The zero-rate case degenerates to straight-line repayment.
/// `periods` may be fractional; the caller guarantees it is positive.
pub fn pmt(present_value: f64, rate: f64, periods: f64) -> f64 {
    if rate == 0.0 {
        return present_value / periods;
    }
    rate * present_value / (1.0 - (1.0 + rate).powf(-periods))
}

/// Number of periods needed to amortize `present_value` with a level
/// `payment` at `rate` per period.
///
/// # Returns
/// `None` when no finite term exists: the payment is not positive, or
/// it does not cover the interest accrued each period.
pub fn nper(present_value: f64, rate: f64, payment: f64) -> Option<f64> {
    if payment <= 0.0 {
        return None;
    }
    if rate == 0.0 {
        return Some(present_value / payment);
    }
    if rate * present_value >= payment {
        return None;
    }
    Some(-(1.0 - rate * present_value / payment).ln() / (1.0 + rate).ln())
}

/// Per-period growth rate implied by moving `present_value` to
/// `future_value` over `periods`.
pub fn rate_of_return(present_value: f64, future_value: f64, periods: f64) -> f64 {
    (future_value / present_value).powf(1.0 / periods) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pmt_standard_loan() {
        // 100k at 10% p.a., monthly repayments over 10 years
        let payment = pmt(100_000.0, 0.1 / 12.0, 120.0);
        assert!(
            (payment - 1321.51).abs() < 0.005,
            "Expected ~1321.51, got {}",
            payment
        );
    }

    #[test]
    fn test_pmt_zero_rate_is_straight_line() {
        assert_relative_eq!(pmt(12_000.0, 0.0, 12.0), 1_000.0);
    }

    #[test]
    fn test_nper_inverts_pmt() {
        let rate = 0.1 / 12.0;
        let payment = pmt(100_000.0, rate, 120.0);
        let periods = nper(100_000.0, rate, payment).unwrap();
        assert_relative_eq!(periods, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nper_zero_rate() {
        assert_relative_eq!(nper(12_000.0, 0.0, 1_000.0).unwrap(), 12.0);
    }

    #[test]
    fn test_nper_rejects_payment_below_interest() {
        // interest alone is 833.33 per month
        assert!(nper(100_000.0, 0.1 / 12.0, 800.0).is_none());
        assert!(nper(100_000.0, 0.1 / 12.0, 0.0).is_none());
        assert!(nper(100_000.0, 0.1 / 12.0, -50.0).is_none());
    }

    #[test]
    fn test_eff_interest_rate_yearly_to_monthly() {
        assert_relative_eq!(eff_interest_rate(0.1, 1.0, 12.0), 0.1 / 12.0);
    }

    #[test]
    fn test_eff_term_years_to_months() {
        assert_relative_eq!(eff_term(10.0, 1.0, 12.0), 120.0);
    }

    #[test]
    fn test_eff_extra_repayment_yearly_to_monthly() {
        // 1200/year quoted yearly is 100/month
        assert_relative_eq!(eff_extra_repayment(1_200.0, 1.0, 12.0), 100.0);
    }

    #[test]
    fn test_rate_of_return_inverts_growth() {
        // doubling over 10 periods
        let rate = rate_of_return(1_000.0, 2_000.0, 10.0);
        assert_relative_eq!((1.0 + rate).powf(10.0), 2.0, epsilon = 1e-12);
    }
}
