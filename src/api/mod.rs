use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    CapitalPoint, ClientData, ProjectionError, ProjectionReport, TableRowData, capital_series,
    run_display_projection, run_projection,
};

const MAX_AGE: u32 = 150;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    #[serde(alias = "ageNow")]
    current_age: Option<u32>,
    #[serde(alias = "ageRetirement")]
    retirement_age: Option<u32>,
    #[serde(alias = "ageDeath")]
    death_age: Option<u32>,

    initial_capital: Option<f64>,
    monthly_savings: Option<f64>,

    return_rate: Option<f64>,
    #[serde(alias = "savingsGrowth")]
    savings_growth_rate: Option<f64>,
    inflation_rate: Option<f64>,

    display: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "retire",
    about = "Retirement passive-income estimator (growing savings + inflation-indexed drawdown)"
)]
pub struct Cli {
    #[arg(long, default_value_t = 30)]
    current_age: u32,
    #[arg(long, default_value_t = 60)]
    retirement_age: u32,
    #[arg(
        long,
        default_value_t = 85,
        help = "Expected age of death; capital is spent by the end of this year"
    )]
    death_age: u32,
    #[arg(long, default_value_t = 0.0)]
    initial_capital: f64,
    #[arg(
        long,
        default_value_t = 200.0,
        help = "Monthly savings at the current age"
    )]
    monthly_savings: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        allow_negative_numbers = true,
        help = "Expected annual investment return in percent"
    )]
    return_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        allow_negative_numbers = true,
        help = "Annual growth of the monthly savings in percent"
    )]
    savings_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        allow_negative_numbers = true,
        help = "Annual inflation in percent; withdrawals rise with it"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        help = "Round the ledger to whole units and show monthly amounts in today's money"
    )]
    display: bool,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

#[derive(Debug)]
struct ApiRequest {
    client: ClientData,
    display: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    #[serde(flatten)]
    report: ProjectionReport,
    chart: Vec<CapitalPoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_inputs(cli: &Cli) -> Result<ClientData, String> {
    if cli.current_age >= cli.retirement_age {
        return Err("--current-age must be < --retirement-age".to_string());
    }

    if cli.current_age >= cli.death_age {
        return Err("--current-age must be < --death-age".to_string());
    }

    if cli.retirement_age >= cli.death_age {
        return Err("--retirement-age must be < --death-age".to_string());
    }

    if cli.death_age > MAX_AGE {
        return Err(format!("--death-age must be <= {MAX_AGE}"));
    }

    for (flag, amount) in [
        ("--initial-capital", cli.initial_capital),
        ("--monthly-savings", cli.monthly_savings),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{flag} must be a finite amount >= 0"));
        }
    }

    for (flag, percent) in [
        ("--return-rate", cli.return_rate),
        ("--savings-growth-rate", cli.savings_growth_rate),
        ("--inflation-rate", cli.inflation_rate),
    ] {
        if !percent.is_finite() || percent <= -100.0 {
            return Err(format!("{flag} must be > -100"));
        }
    }

    Ok(ClientData {
        age_now: cli.current_age,
        age_retirement: cli.retirement_age,
        age_death: cli.death_age,
        initial_capital: cli.initial_capital,
        monthly_savings: cli.monthly_savings,
        return_rate: cli.return_rate / 100.0,
        savings_growth_rate: cli.savings_growth_rate / 100.0,
        inflation_rate: cli.inflation_rate / 100.0,
    })
}

fn project(client: &ClientData, display: bool) -> Result<ProjectionReport, ProjectionError> {
    if display {
        run_display_projection(client)
    } else {
        run_projection(client)
    }
}

/// Runs one projection for parsed command-line flags and renders it.
pub fn run_cli(cli: Cli) -> Result<String, String> {
    let client = build_inputs(&cli)?;
    let report = project(&client, cli.display).map_err(|e| e.to_string())?;
    tracing::debug!(
        rows = report.rows.len(),
        monthly_passive_income = report.monthly_passive_income,
        "projection complete"
    );

    if cli.json {
        let response = build_projection_response(report);
        return serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize report: {e}"));
    }
    Ok(render_report(&report))
}

fn render_report(report: &ProjectionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Estimated monthly passive income (today's money): {:.0}\n",
        report.monthly_passive_income_rounded
    ));
    out.push_str(&format!(
        "Capital at retirement ({} years of saving): {:.2}\n",
        report.accumulation_years, report.capital_at_retirement
    ));
    out.push_str(&format!(
        "First yearly withdrawal ({} years of drawdown): {:.2}\n\n",
        report.distribution_years, report.first_withdrawal
    ));
    out.push_str(&format!(
        "{:>4} {:>16} {:>14} {:>16} {:>16} {:>14}\n",
        "Age", "Capital Start", "Interest", "Saved/Withdrawn", "Capital End", "Monthly"
    ));
    for row in &report.rows {
        out.push_str(&render_row(row));
    }
    out
}

fn render_row(row: &TableRowData) -> String {
    format!(
        "{:>4} {:>16.2} {:>14.2} {:>16.2} {:>16.2} {:>14.2}\n",
        row.age,
        cents(row.capital_year_start),
        cents(row.interest),
        cents(row.saved),
        cents(row.capital_year_end),
        cents(row.saved_pp_monthly)
    )
}

/// Rounds to two decimals so a residual like -1e-11 prints as `0.00`, not `-0.00`.
fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Projection HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/projection");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(
    payload: Result<Query<ProjectionPayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

async fn projection_post_handler(
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(payload).await,
        Err(rejection) => payload_rejected(&rejection.body_text()),
    }
}

fn payload_rejected(msg: &str) -> Response {
    tracing::warn!(error = %msg, "malformed projection payload");
    error_response(StatusCode::BAD_REQUEST, msg)
}

async fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            tracing::warn!(error = %msg, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    tracing::debug!(client = ?request.client, display = request.display, "projection request");

    match project(&request.client, request.display) {
        Ok(report) => json_response(StatusCode::OK, build_projection_response(report)),
        Err(err) => {
            tracing::warn!(error = %err, "projection failed");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string())
        }
    }
}

fn build_projection_response(report: ProjectionReport) -> ProjectionResponse {
    let chart = capital_series(&report.rows);
    ProjectionResponse { report, chart }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectionPayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.death_age {
        cli.death_age = v;
    }
    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_savings {
        cli.monthly_savings = v;
    }
    if let Some(v) = payload.return_rate {
        cli.return_rate = v;
    }
    if let Some(v) = payload.savings_growth_rate {
        cli.savings_growth_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }

    let client = build_inputs(&cli)?;
    Ok(ApiRequest {
        client,
        display: payload.display.unwrap_or(false),
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: 30,
        retirement_age: 60,
        death_age: 85,
        initial_capital: 0.0,
        monthly_savings: 200.0,
        return_rate: 7.0,
        savings_growth_rate: 2.0,
        inflation_rate: 2.0,
        display: false,
        json: false,
    }
}
