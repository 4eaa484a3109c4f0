use serde::Serialize;

pub const MILESTONE_THRESHOLDS: [f64; 3] = [1_000_000.0, 2_000_000.0, 5_000_000.0];

// 100 years; a search that converges here is read as "not reached".
pub const SEARCH_HORIZON_MONTHS: u32 = 1_200;

pub const RATE_SEARCH_MAX_PERCENT: f64 = 50.0;
pub const RATE_SEARCH_STEP_PERCENT: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Inputs {
    pub principal: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate: f64,
    pub years: u32,
    pub inflation_rate: f64,
    pub savings_rate: f64,
    pub bonds_rate: f64,
    pub best_year_rate: f64,
    pub worst_year_rate: f64,
    pub withdrawal_rate: f64,
    pub target_monthly_income: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub month: u32,
    pub year: u32,
    pub balance: f64,
    pub contributions: f64,
    pub gains: f64,
    pub real_balance: f64,
    pub savings_balance: f64,
    pub bonds_balance: f64,
    pub best_case_balance: f64,
    pub worst_case_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_gains: f64,
    pub real_final_balance: f64,
    pub sustainable_monthly_income: f64,
    pub years_to_first_million: f64,
    pub years_to_two_million: f64,
    pub years_to_five_million: f64,
    pub advantage_over_savings: f64,
    pub advantage_over_bonds: f64,
    pub required_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPlan {
    pub target_monthly_income: f64,
    pub target_balance: f64,
    pub required_principal: f64,
    pub contributions_alone_suffice: bool,
    pub required_rate: Option<f64>,
}
