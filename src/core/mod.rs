mod engine;
mod solver;
mod types;

pub use engine::{compute_metrics, future_value, project, years_to_milestone};
pub use solver::{required_principal, required_rate_for_income, solve_goal};
pub use types::{
    GoalPlan, Inputs, MILESTONE_THRESHOLDS, Metrics, ProjectionPoint, RATE_SEARCH_MAX_PERCENT,
    RATE_SEARCH_STEP_PERCENT, SEARCH_HORIZON_MONTHS,
};
