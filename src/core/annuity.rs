use super::types::ProjectionError;

/// Value after `periods` years of `principal` compounding at `rate`, plus a
/// contribution stream that starts at `contribution` and grows by
/// `contribution_growth` each year. Contributions are made at year end.
///
/// ```text
/// FV = c0·(1+r)^N + p·Σ_{k=0}^{N-1} (1+r)^(N-(k+1))·(1+g)^k
/// ```
///
/// `periods == 0` returns `principal` unchanged. Period counts are used as
/// `i32` exponents and must stay at or below `i32::MAX`; the projection
/// entry points bound them through [`MAX_SUPPORTED_AGE`](super::types::MAX_SUPPORTED_AGE).
pub fn future_value(
    principal: f64,
    rate: f64,
    contribution_growth: f64,
    contribution: f64,
    periods: u32,
) -> f64 {
    let compound = 1.0 + rate;
    let escalate = 1.0 + contribution_growth;
    let stream: f64 = (0..periods)
        .map(|k| compound.powi((periods - (k + 1)) as i32) * escalate.powi(k as i32))
        .sum();
    principal * compound.powi(periods as i32) + contribution * stream
}

/// First withdrawal of a schedule escalating at `withdrawal_growth` per year
/// that draws `principal` (earning `rate` on the undrawn balance) down to
/// exactly zero after `periods` withdrawals.
///
/// ```text
/// W1 = c0·(1+r)^N / Σ_{k=0}^{N-1} (1+r)^(N-1-k)·(1+i)^k
/// ```
///
/// `periods` has the same `i32::MAX` ceiling as [`future_value`].
///
/// # Errors
///
/// [`ProjectionError::DivisionByZero`] when the denominator vanishes, which is
/// always the case for `periods == 0`.
pub fn initial_withdrawal(
    principal: f64,
    rate: f64,
    withdrawal_growth: f64,
    periods: u32,
) -> Result<f64, ProjectionError> {
    let compound = 1.0 + rate;
    let escalate = 1.0 + withdrawal_growth;
    let denominator: f64 = (0..periods)
        .map(|k| compound.powi((periods - 1 - k) as i32) * escalate.powi(k as i32))
        .sum();
    if denominator == 0.0 {
        return Err(ProjectionError::DivisionByZero { periods });
    }
    Ok(principal * compound.powi(periods as i32) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= EPS * scale,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn future_value_with_zero_periods_is_principal() {
        assert_eq!(future_value(5_000.0, 0.07, 0.02, 24_000.0, 0), 5_000.0);
    }

    #[test]
    fn future_value_single_year_adds_interest_and_one_contribution() {
        assert_approx(future_value(5_000.0, 0.07, 0.02, 24_000.0, 1), 29_350.0);
    }

    #[test]
    fn future_value_level_contributions_match_annuity_closed_form() {
        let r: f64 = 0.05;
        let growth = (1.0 + r).powi(10);
        let expected = 1_000.0 * growth + 500.0 * (growth - 1.0) / r;
        assert_approx(future_value(1_000.0, r, 0.0, 500.0, 10), expected);
    }

    #[test]
    fn future_value_contribution_growing_at_return_rate() {
        // Σ collapses to N·(1+r)^(N-1) when g == r.
        let r: f64 = 0.04;
        let expected = 100.0 * 20.0 * (1.0 + r).powi(19);
        assert_approx(future_value(0.0, r, r, 100.0, 20), expected);
    }

    #[test]
    fn initial_withdrawal_rejects_zero_periods() {
        assert_eq!(
            initial_withdrawal(100_000.0, 0.07, 0.02, 0),
            Err(ProjectionError::DivisionByZero { periods: 0 })
        );
    }

    #[test]
    fn initial_withdrawal_single_period_takes_everything_with_interest() {
        let w1 = initial_withdrawal(84_766.0, 0.07, 0.02, 1).expect("one period");
        assert_approx(w1, 84_766.0 * 1.07);
    }

    #[test]
    fn initial_withdrawal_without_interest_or_inflation_splits_evenly() {
        let w1 = initial_withdrawal(60_000.0, 0.0, 0.0, 12).expect("non-zero periods");
        assert_approx(w1, 5_000.0);
    }

    #[test]
    fn initial_withdrawal_escalating_at_return_rate() {
        let r = 0.03;
        let w1 = initial_withdrawal(90_000.0, r, r, 30).expect("non-zero periods");
        assert_approx(w1, 90_000.0 * (1.0 + r) / 30.0);
    }

    #[test]
    fn initial_withdrawal_of_zero_principal_is_zero() {
        let w1 = initial_withdrawal(0.0, 0.07, 0.02, 25).expect("non-zero periods");
        assert_eq!(w1, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_withdrawal_schedule_exhausts_principal(
            principal in 0.0f64..2_000_000.0,
            rate in 0.0f64..0.15,
            growth in 0.0f64..0.08,
            periods in 1u32..80,
        ) {
            let w1 = initial_withdrawal(principal, rate, growth, periods).expect("non-zero periods");
            let mut balance = principal;
            let mut peak = principal;
            for k in 0..periods {
                balance = balance * (1.0 + rate) - w1 * (1.0 + growth).powi(k as i32);
                peak = peak.max(balance.abs());
            }
            prop_assert!(balance.abs() <= 1e-9 * peak.max(1.0), "residual {balance}");
        }

        #[test]
        fn prop_future_value_splits_into_principal_and_stream(
            principal in 0.0f64..1_000_000.0,
            contribution in 0.0f64..100_000.0,
            rate in 0.0f64..0.15,
            growth in 0.0f64..0.08,
            periods in 0u32..60,
        ) {
            let whole = future_value(principal, rate, growth, contribution, periods);
            let parts = future_value(principal, rate, growth, 0.0, periods)
                + future_value(0.0, rate, growth, contribution, periods);
            prop_assert!((whole - parts).abs() <= 1e-9 * whole.abs().max(1.0));
        }
    }
}
