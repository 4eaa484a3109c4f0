use super::solver::required_rate_for_income;
use super::types::{Inputs, MILESTONE_THRESHOLDS, Metrics, ProjectionPoint, SEARCH_HORIZON_MONTHS};

pub fn future_value(
    principal: f64,
    monthly_contribution: f64,
    annual_rate_percent: f64,
    months: u32,
) -> f64 {
    let rate = annual_rate_percent / 100.0 / 12.0;
    // The annuity term divides by the periodic rate; at exactly zero the
    // series degenerates to simple accumulation.
    if rate == 0.0 {
        return principal + monthly_contribution * months as f64;
    }

    let growth = (1.0 + rate).powi(months as i32);
    principal * growth + monthly_contribution * ((growth - 1.0) / rate)
}

pub fn project(inputs: &Inputs) -> Vec<ProjectionPoint> {
    let months = inputs.years * 12;
    let inflation_base = 1.0 + inputs.inflation_rate / 100.0;

    let mut series = Vec::with_capacity(months as usize);
    for month in 1..=months {
        let balance = future_value(
            inputs.principal,
            inputs.monthly_contribution,
            inputs.annual_return_rate,
            month,
        );
        let contributions = inputs.principal + inputs.monthly_contribution * month as f64;
        let real_balance = balance / inflation_base.powf(month as f64 / 12.0);

        let comparison = |rate: f64| {
            future_value(inputs.principal, inputs.monthly_contribution, rate, month).round()
        };

        // Rounding happens only here, at emission; emitted gains are the
        // difference of the emitted balance and contributions so the
        // balance == contributions + gains identity holds on every point.
        let balance = balance.round();
        let contributions = contributions.round();
        series.push(ProjectionPoint {
            month,
            year: month / 12,
            balance,
            contributions,
            gains: balance - contributions,
            real_balance: real_balance.round(),
            savings_balance: comparison(inputs.savings_rate),
            bonds_balance: comparison(inputs.bonds_rate),
            best_case_balance: comparison(inputs.best_year_rate),
            worst_case_balance: comparison(inputs.worst_year_rate),
        });
    }

    series
}

pub fn years_to_milestone(
    principal: f64,
    monthly_contribution: f64,
    annual_rate_percent: f64,
    target_amount: f64,
) -> f64 {
    if principal >= target_amount {
        return 0.0;
    }

    let mut low = 0_u32;
    let mut high = SEARCH_HORIZON_MONTHS;
    while low < high {
        let mid = low + (high - low) / 2;
        let balance = future_value(principal, monthly_contribution, annual_rate_percent, mid);
        if balance < target_amount {
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    f64::from(low) / 12.0
}

pub fn compute_metrics(series: &[ProjectionPoint], inputs: &Inputs) -> Metrics {
    let months = series.len() as u32;
    let last = series.last().expect("projection series is non-empty");

    let milestone = |target: f64| {
        years_to_milestone(
            inputs.principal,
            inputs.monthly_contribution,
            inputs.annual_return_rate,
            target,
        )
    };

    Metrics {
        final_balance: last.balance,
        total_contributions: last.contributions,
        total_gains: last.gains,
        real_final_balance: last.real_balance,
        sustainable_monthly_income: (last.balance * inputs.withdrawal_rate / 12.0).round(),
        years_to_first_million: milestone(MILESTONE_THRESHOLDS[0]),
        years_to_two_million: milestone(MILESTONE_THRESHOLDS[1]),
        years_to_five_million: milestone(MILESTONE_THRESHOLDS[2]),
        advantage_over_savings: last.balance - last.savings_balance,
        advantage_over_bonds: last.balance - last.bonds_balance,
        required_rate: inputs
            .target_monthly_income
            .and_then(|income| required_rate_for_income(inputs, income, months)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_inputs() -> Inputs {
        Inputs {
            principal: 10_000.0,
            monthly_contribution: 500.0,
            annual_return_rate: 10.0,
            years: 30,
            inflation_rate: 3.0,
            savings_rate: 1.5,
            bonds_rate: 4.5,
            best_year_rate: 30.0,
            worst_year_rate: -20.0,
            withdrawal_rate: 0.04,
            target_monthly_income: None,
        }
    }

    #[test]
    fn future_value_at_zero_rate_is_simple_accumulation() {
        assert_eq!(future_value(1_000.0, 100.0, 0.0, 12), 2_200.0);
        assert_eq!(future_value(0.0, 0.0, 0.0, 1_200), 0.0);
    }

    #[test]
    fn future_value_at_zero_months_is_the_principal() {
        assert_approx(future_value(5_000.0, 250.0, 8.0, 0), 5_000.0);
        assert_approx(future_value(5_000.0, 250.0, 0.0, 0), 5_000.0);
    }

    #[test]
    fn future_value_shrinks_at_negative_rate() {
        // 12 months at -12%/yr is a flat -1% per month on the principal.
        let balance = future_value(10_000.0, 0.0, -12.0, 12);
        assert_approx_tol(balance, 10_000.0 * 0.99_f64.powi(12), 1e-9);
        assert!(balance < 10_000.0);
        assert!(balance > 0.0);
    }

    #[test]
    fn future_value_matches_hand_compounded_year() {
        // ((1000 * 1.01 + 100) * 1.01 + 100) * 1.01 + 100, three months at 12%/yr.
        let mut expected = 1_000.0;
        for _ in 0..3 {
            expected = expected * 1.01 + 100.0;
        }
        assert_approx_tol(future_value(1_000.0, 100.0, 12.0, 3), expected, 1e-9);
    }

    #[test]
    fn projection_has_one_point_per_month() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        assert_eq!(series.len(), 360);
        assert_eq!(series[0].month, 1);
        assert_eq!(series[0].year, 0);
        assert_eq!(series[10].year, 0);
        assert_eq!(series[11].year, 1);
        assert_eq!(series[359].month, 360);
        assert_eq!(series[359].year, 30);
    }

    #[test]
    fn projection_accounts_contributions_and_gains_exactly() {
        let inputs = sample_inputs();
        for point in project(&inputs) {
            let expected =
                (inputs.principal + inputs.monthly_contribution * point.month as f64).round();
            assert_eq!(point.contributions, expected);
            assert_eq!(point.balance, point.contributions + point.gains);
        }
    }

    #[test]
    fn projection_is_idempotent() {
        let inputs = sample_inputs();
        assert_eq!(project(&inputs), project(&inputs));
    }

    #[test]
    fn projection_balances_never_decrease_for_non_negative_rates() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        for pair in series.windows(2) {
            assert!(pair[1].balance >= pair[0].balance);
            assert!(pair[1].savings_balance >= pair[0].savings_balance);
            assert!(pair[1].bonds_balance >= pair[0].bonds_balance);
            assert!(pair[1].best_case_balance >= pair[0].best_case_balance);
        }
    }

    #[test]
    fn projection_real_balance_discounts_by_inflation() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        let last = series[series.len() - 1];
        let expected = (last.balance / 1.03_f64.powf(30.0)).round();
        // Both sides round a balance that was itself rounded, so allow a unit.
        assert_approx_tol(last.real_balance, expected, 1.0);
        assert!(last.real_balance < last.balance);
    }

    #[test]
    fn thirty_year_scenario_matches_closed_form() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        let last = series[series.len() - 1];

        let rate: f64 = 10.0 / 100.0 / 12.0;
        let growth = (1.0 + rate).powi(360);
        let expected: f64 = 10_000.0 * growth + 500.0 * ((growth - 1.0) / rate);

        assert_eq!(last.balance, expected.round());
        assert!(last.balance > 1_000_000.0);
    }

    #[test]
    fn milestone_already_met_returns_zero() {
        assert_eq!(years_to_milestone(2_000_000.0, 0.0, 5.0, 1_000_000.0), 0.0);
        assert_eq!(years_to_milestone(1_000_000.0, 0.0, 5.0, 1_000_000.0), 0.0);
    }

    #[test]
    fn milestone_search_finds_first_month_at_or_above_target() {
        let years = years_to_milestone(0.0, 1_000.0, 10.0, 1_000_000.0);
        assert!(years > 0.0);
        assert!(years < 100.0);

        let months = (years * 12.0).round() as u32;
        assert!(future_value(0.0, 1_000.0, 10.0, months) >= 1_000_000.0);
        assert!(future_value(0.0, 1_000.0, 10.0, months - 1) < 1_000_000.0);
    }

    #[test]
    fn milestone_search_converges_to_horizon_when_unreachable() {
        assert_eq!(years_to_milestone(0.0, 0.0, 0.0, 1_000_000.0), 100.0);
        assert_eq!(years_to_milestone(100.0, 1.0, 0.0, 1_000_000.0), 100.0);
    }

    #[test]
    fn metrics_read_the_final_point() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        let last = series[series.len() - 1];
        let metrics = compute_metrics(&series, &inputs);

        assert_eq!(metrics.final_balance, last.balance);
        assert_eq!(metrics.total_contributions, last.contributions);
        assert_eq!(metrics.total_gains, last.gains);
        assert_eq!(metrics.real_final_balance, last.real_balance);
        assert_eq!(
            metrics.sustainable_monthly_income,
            (last.balance * 0.04 / 12.0).round()
        );
        assert_eq!(
            metrics.advantage_over_savings,
            last.balance - last.savings_balance
        );
        assert_eq!(metrics.advantage_over_bonds, last.balance - last.bonds_balance);
        assert_eq!(metrics.required_rate, None);
    }

    #[test]
    fn metrics_milestones_are_ordered() {
        let inputs = sample_inputs();
        let series = project(&inputs);
        let metrics = compute_metrics(&series, &inputs);

        assert!(metrics.years_to_first_million > 0.0);
        assert!(metrics.years_to_first_million <= metrics.years_to_two_million);
        assert!(metrics.years_to_two_million <= metrics.years_to_five_million);
        assert!(metrics.years_to_five_million < 100.0);
    }

    #[test]
    fn metrics_report_first_rate_reaching_the_income_target() {
        let mut inputs = sample_inputs();
        inputs.target_monthly_income = Some(2_000.0);
        let series = project(&inputs);
        let metrics = compute_metrics(&series, &inputs);

        let rate = metrics.required_rate.expect("a rate below 50% suffices");
        let target_balance = 2_000.0 * 12.0 / inputs.withdrawal_rate;
        assert!(future_value(inputs.principal, inputs.monthly_contribution, rate, 360) >= target_balance);
        assert!(
            future_value(inputs.principal, inputs.monthly_contribution, rate - 0.1, 360)
                < target_balance
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_future_value_non_decreasing_in_months(
            principal in 0u32..1_000_000,
            contribution in 0u32..10_000,
            rate_bp in 0u32..2_000,
            months in 0u32..600
        ) {
            let rate = rate_bp as f64 / 100.0;
            let shorter = future_value(principal as f64, contribution as f64, rate, months);
            let longer = future_value(principal as f64, contribution as f64, rate, months + 1);
            prop_assert!(longer + 1e-6 >= shorter);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_milestone_brackets_the_target(
            principal in 0u32..500_000,
            contribution in 1u32..5_000,
            rate_bp in 0u32..1_500,
            target in 100_000u32..3_000_000
        ) {
            let rate = rate_bp as f64 / 100.0;
            let years = years_to_milestone(
                principal as f64,
                contribution as f64,
                rate,
                target as f64,
            );
            prop_assume!(years > 0.0 && years < 100.0);

            let months = (years * 12.0).round() as u32;
            prop_assert!(
                future_value(principal as f64, contribution as f64, rate, months)
                    >= target as f64
            );
            prop_assert!(
                future_value(principal as f64, contribution as f64, rate, months - 1)
                    < target as f64
            );
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_projection_is_pure_and_sized(
            principal in 0u32..200_000,
            contribution in 0u32..3_000,
            rate_bp in 0u32..1_500,
            years in 1u32..41
        ) {
            let mut inputs = sample_inputs();
            inputs.principal = principal as f64;
            inputs.monthly_contribution = contribution as f64;
            inputs.annual_return_rate = rate_bp as f64 / 100.0;
            inputs.years = years;

            let series = project(&inputs);
            prop_assert!(series.len() == (years * 12) as usize);
            prop_assert!(series == project(&inputs));

            for point in &series {
                prop_assert!(point.balance == point.contributions + point.gains);
                prop_assert!(point.balance.is_finite());
                prop_assert!(point.real_balance <= point.balance + 1.0);
            }
        }
    }
}
