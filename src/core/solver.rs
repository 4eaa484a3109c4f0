use super::engine::future_value;
use super::types::{GoalPlan, Inputs, RATE_SEARCH_MAX_PERCENT, RATE_SEARCH_STEP_PERCENT};

pub fn required_principal(
    target_value: f64,
    monthly_contribution: f64,
    annual_rate_percent: f64,
    months: u32,
) -> f64 {
    let rate = annual_rate_percent / 100.0 / 12.0;
    // Same zero-rate degeneration as the forward formula. The result is
    // floored at zero: contributions alone covering the target is reported
    // as "no principal needed", not as a negative balance.
    if rate == 0.0 {
        return (target_value - monthly_contribution * months as f64).max(0.0);
    }

    let growth = (1.0 + rate).powi(months as i32);
    let contribution_value = monthly_contribution * ((growth - 1.0) / rate);
    ((target_value - contribution_value) / growth).max(0.0)
}

pub fn required_rate_for_income(
    inputs: &Inputs,
    target_monthly_income: f64,
    months: u32,
) -> Option<f64> {
    let target_balance = target_monthly_income * 12.0 / inputs.withdrawal_rate;
    let steps = (RATE_SEARCH_MAX_PERCENT / RATE_SEARCH_STEP_PERCENT).round() as u32;

    // Coarse fixed-step scan, first match wins. The step granularity is the
    // reported precision; this is not a root-find.
    for step in 0..=steps {
        let rate = step as f64 * RATE_SEARCH_STEP_PERCENT;
        let balance = future_value(inputs.principal, inputs.monthly_contribution, rate, months);
        if balance >= target_balance {
            return Some(rate);
        }
    }

    None
}

pub fn solve_goal(inputs: &Inputs, target_monthly_income: f64) -> GoalPlan {
    let months = inputs.years * 12;
    let target_balance = target_monthly_income * 12.0 / inputs.withdrawal_rate;
    let principal = required_principal(
        target_balance,
        inputs.monthly_contribution,
        inputs.annual_return_rate,
        months,
    );

    GoalPlan {
        target_monthly_income,
        target_balance: target_balance.round(),
        required_principal: principal.round(),
        contributions_alone_suffice: principal == 0.0,
        required_rate: required_rate_for_income(inputs, target_monthly_income, months),
    }
}
