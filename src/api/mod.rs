use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    GoalPlan, Inputs, Metrics, ProjectionPoint, compute_metrics, project, solve_goal,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum PlanMode {
    Projection,
    Goal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPlanMode {
    Projection,
    Goal,
}

impl From<CliPlanMode> for PlanMode {
    fn from(value: CliPlanMode) -> Self {
        match value {
            CliPlanMode::Projection => PlanMode::Projection,
            CliPlanMode::Goal => PlanMode::Goal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPlanMode {
    #[serde(alias = "project", alias = "forecast")]
    Projection,
    #[serde(alias = "income", alias = "targetIncome", alias = "target_income")]
    Goal,
}

impl From<ApiPlanMode> for CliPlanMode {
    fn from(value: ApiPlanMode) -> Self {
        match value {
            ApiPlanMode::Projection => CliPlanMode::Projection,
            ApiPlanMode::Goal => CliPlanMode::Goal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseMode {
    Projection,
    Goal,
}

impl From<PlanMode> for ResponseMode {
    fn from(value: PlanMode) -> Self {
        match value {
            PlanMode::Projection => ResponseMode::Projection,
            PlanMode::Goal => ResponseMode::Goal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    principal: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return_rate: Option<f64>,
    years: Option<u32>,
    inflation_rate: Option<f64>,
    savings_rate: Option<f64>,
    bonds_rate: Option<f64>,
    best_year_rate: Option<f64>,
    worst_year_rate: Option<f64>,
    withdrawal_rate: Option<f64>,
    target_monthly_income: Option<f64>,
    mode: Option<ApiPlanMode>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Compound-growth projection calculator (monthly contributions, comparison scenarios, income goals)"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, help = "Starting balance")]
    principal: f64,
    #[arg(
        long,
        default_value_t = 500.0,
        help = "Amount added at the end of each month"
    )]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent, e.g. 10"
    )]
    annual_return_rate: f64,
    #[arg(long, default_value_t = 30, help = "Projection horizon in years")]
    years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual inflation rate in percent used for the real-value series"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Cash-savings comparison rate in percent"
    )]
    savings_rate: f64,
    #[arg(long, default_value_t = 4.5, help = "Bond comparison rate in percent")]
    bonds_rate: f64,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Best-year comparison rate in percent"
    )]
    best_year_rate: f64,
    #[arg(
        long,
        default_value_t = -20.0,
        allow_negative_numbers = true,
        help = "Worst-year comparison rate in percent"
    )]
    worst_year_rate: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Sustainable annual withdrawal rate in percent"
    )]
    withdrawal_rate: f64,
    #[arg(
        long,
        help = "Monthly retirement income the plan should fund, used when --mode=goal"
    )]
    target_monthly_income: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliPlanMode::Projection)]
    mode: CliPlanMode,
}

#[derive(Copy, Clone, Debug)]
struct ApiOptions {
    mode: PlanMode,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: Inputs,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    mode: ResponseMode,
    years: u32,
    annual_return_rate: f64,
    goal: Option<GoalPlan>,
    metrics: Metrics,
    series: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    if !cli.principal.is_finite() || cli.principal < 0.0 {
        return Err("--principal must be >= 0".to_string());
    }

    if !cli.monthly_contribution.is_finite() {
        return Err("--monthly-contribution must be a finite number".to_string());
    }

    for (name, rate) in [
        ("--annual-return-rate", cli.annual_return_rate),
        ("--inflation-rate", cli.inflation_rate),
        ("--savings-rate", cli.savings_rate),
        ("--bonds-rate", cli.bonds_rate),
        ("--best-year-rate", cli.best_year_rate),
        ("--worst-year-rate", cli.worst_year_rate),
    ] {
        if !rate.is_finite() || rate <= -100.0 {
            return Err(format!("{name} must be > -100"));
        }
    }

    if cli.years == 0 || cli.years > 100 {
        return Err("--years must be between 1 and 100".to_string());
    }

    if !cli.withdrawal_rate.is_finite()
        || cli.withdrawal_rate <= 0.0
        || cli.withdrawal_rate > 100.0
    {
        return Err("--withdrawal-rate must be between 0 and 100".to_string());
    }

    if let Some(income) = cli.target_monthly_income {
        if !income.is_finite() || income <= 0.0 {
            return Err("--target-monthly-income must be > 0".to_string());
        }
    }

    Ok(Inputs {
        principal: cli.principal,
        monthly_contribution: cli.monthly_contribution,
        annual_return_rate: cli.annual_return_rate,
        years: cli.years,
        inflation_rate: cli.inflation_rate,
        savings_rate: cli.savings_rate,
        bonds_rate: cli.bonds_rate,
        best_year_rate: cli.best_year_rate,
        worst_year_rate: cli.worst_year_rate,
        withdrawal_rate: cli.withdrawal_rate / 100.0,
        target_monthly_income: cli.target_monthly_income,
    })
}

fn api_request_from_cli(cli: Cli) -> Result<ApiRequest, String> {
    let mode: PlanMode = cli.mode.into();
    let mut inputs = build_inputs(cli)?;

    match mode {
        PlanMode::Projection => {
            // The required-rate metric belongs to goal mode; a stray target
            // income in projection mode is ignored rather than rejected.
            inputs.target_monthly_income = None;
        }
        PlanMode::Goal => {
            if inputs.target_monthly_income.is_none() {
                return Err("--target-monthly-income is required when --mode=goal".to_string());
            }
        }
    }

    Ok(ApiRequest {
        inputs,
        options: ApiOptions { mode },
    })
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return_rate {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.savings_rate {
        cli.savings_rate = v;
    }
    if let Some(v) = payload.bonds_rate {
        cli.bonds_rate = v;
    }
    if let Some(v) = payload.best_year_rate {
        cli.best_year_rate = v;
    }
    if let Some(v) = payload.worst_year_rate {
        cli.worst_year_rate = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        cli.withdrawal_rate = v;
    }
    if let Some(v) = payload.target_monthly_income {
        cli.target_monthly_income = Some(v);
    }
    if let Some(v) = payload.mode {
        cli.mode = v.into();
    }

    api_request_from_cli(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 10_000.0,
        monthly_contribution: 500.0,
        annual_return_rate: 10.0,
        years: 30,
        inflation_rate: 3.0,
        savings_rate: 1.5,
        bonds_rate: 4.5,
        best_year_rate: 30.0,
        worst_year_rate: -20.0,
        withdrawal_rate: 4.0,
        target_monthly_income: None,
        mode: CliPlanMode::Projection,
    }
}

fn run_request(request: &ApiRequest) -> ProjectResponse {
    match (request.options.mode, request.inputs.target_monthly_income) {
        (PlanMode::Goal, Some(income)) => {
            let plan = solve_goal(&request.inputs, income);
            let inputs = Inputs {
                principal: plan.required_principal,
                ..request.inputs.clone()
            };
            let series = project(&inputs);
            let metrics = compute_metrics(&series, &inputs);
            build_project_response(&inputs, PlanMode::Goal, Some(plan), metrics, series)
        }
        _ => {
            let series = project(&request.inputs);
            let metrics = compute_metrics(&series, &request.inputs);
            build_project_response(&request.inputs, PlanMode::Projection, None, metrics, series)
        }
    }
}

fn build_project_response(
    inputs: &Inputs,
    mode: PlanMode,
    goal: Option<GoalPlan>,
    metrics: Metrics,
    series: Vec<ProjectionPoint>,
) -> ProjectResponse {
    ProjectResponse {
        mode: mode.into(),
        years: inputs.years,
        annual_return_rate: inputs.annual_return_rate,
        goal,
        metrics,
        series,
    }
}

pub fn run_cli_projection(args: &[String]) -> Result<String, String> {
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let request = api_request_from_cli(cli)?;
    let response = run_request(&request);
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    json_response(StatusCode::OK, run_request(&request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: message.to_string(),
        },
    )
}
