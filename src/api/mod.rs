use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    InvestmentType, RawParameters, SimulationParameters, SimulationResult, Statistics,
    compute_result, run_seeded,
};
use crate::data::HistoricalData;
use crate::error::Result;
use crate::prompt::{ParameterOverrides, Prompter};
use crate::report::{BarChart, JsonReport, Report, ReportSink, TextSummary};

/// Upper bound on runs accepted over HTTP.
const API_MAX_SIMULATIONS: u32 = 200_000;
const API_DEFAULT_SEED: u64 = 42;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliInvestmentType {
    Stocks,
    Bonds,
    #[value(name = "50_50_blend")]
    Blend5050,
    #[value(name = "40_50_10_blend")]
    Blend405010,
}

impl From<CliInvestmentType> for InvestmentType {
    fn from(value: CliInvestmentType) -> Self {
        match value {
            CliInvestmentType::Stocks => InvestmentType::Stocks,
            CliInvestmentType::Bonds => InvestmentType::Bonds,
            CliInvestmentType::Blend5050 => InvestmentType::Blend5050,
            CliInvestmentType::Blend405010 => InvestmentType::Blend405010,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Odds of outliving a retirement portfolio, by bootstrap resampling of 1926-2013 returns"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level for nestegg (RUST_LOG overrides)"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation; missing values are prompted for interactively
    Run(RunArgs),
    /// Serve the simulation over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, value_enum)]
    invest_type: Option<CliInvestmentType>,
    #[arg(long, help = "Starting investment in whole dollars")]
    start_value: Option<i64>,
    #[arg(long, help = "First-year withdrawal in whole dollars; grows with inflation")]
    withdrawal: Option<i64>,
    #[arg(long)]
    min_years: Option<u32>,
    #[arg(long)]
    most_likely_years: Option<u32>,
    #[arg(long)]
    max_years: Option<u32>,
    #[arg(long, help = "Number of simulation runs")]
    num_sim: Option<u32>,
    #[arg(long, help = "Master seed; a random one is drawn and logged when omitted")]
    seed: Option<u64>,
    #[arg(long, env = "NESTEGG_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
    #[arg(long, help = "Print the report as JSON instead of text")]
    json: bool,
    #[arg(long, help = "Skip the bar chart")]
    no_chart: bool,
    #[arg(long, default_value_t = 100)]
    chart_width: usize,
    #[arg(long, default_value_t = 15)]
    chart_height: usize,
}

impl RunArgs {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            invest_type: self.invest_type.map(Into::into),
            start_value: self.start_value,
            withdrawal: self.withdrawal,
            min_years: self.min_years,
            most_likely_years: self.most_likely_years,
            max_years: self.max_years,
            num_sim: self.num_sim,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "NESTEGG_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

/// One finished simulation with everything a report needs.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub params: SimulationParameters,
    pub seed: u64,
    pub result: SimulationResult,
    pub statistics: Statistics,
}

impl SimulationOutput {
    pub fn report(&self) -> Report<'_> {
        Report::new(&self.params, &self.statistics, &self.result.outcomes)
    }
}

pub fn simulate(
    data: &HistoricalData,
    params: SimulationParameters,
    seed: u64,
) -> Result<SimulationOutput> {
    let returns = data.returns_for(params.invest_type());
    tracing::info!(
        invest_type = %params.invest_type(),
        runs = params.num_sim(),
        seed,
        "starting simulation"
    );
    let result = run_seeded(&params, returns, data.inflation(), seed)?;
    let statistics = compute_result(&result)?;
    tracing::info!(
        odds = statistics.odds_of_bankruptcy,
        average = statistics.average_outcome,
        "simulation finished"
    );
    Ok(SimulationOutput {
        params,
        seed,
        result,
        statistics,
    })
}

pub fn run_command(args: RunArgs) -> Result<()> {
    let data = HistoricalData::load(&args.data_dir)?;

    let overrides = args.overrides();
    let params = if overrides.is_complete() {
        Prompter::new(io::empty(), io::sink()).collect(overrides)?
    } else {
        let stdin = io::stdin();
        Prompter::new(stdin.lock(), io::stdout()).collect(overrides)?
    };

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let output = simulate(&data, params, seed)?;
    let report = output.report();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        JsonReport::new(&mut out).render(&report)?;
    } else {
        TextSummary::new(&mut out).render(&report)?;
        if !args.no_chart {
            BarChart::new(&mut out, args.chart_width, args.chart_height).render(&report)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub async fn run_serve_command(args: ServeArgs) -> Result<()> {
    let data = HistoricalData::load(&args.data_dir)?;
    run_http_server(args.port, Arc::new(data)).await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    invest_type: Option<String>,
    start_value: Option<i64>,
    withdrawal: Option<i64>,
    min_years: Option<u32>,
    most_likely_years: Option<u32>,
    max_years: Option<u32>,
    num_sim: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug)]
struct ApiRequest {
    params: SimulationParameters,
    seed: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse<'a> {
    seed: u64,
    #[serde(flatten)]
    report: Report<'a>,
}

#[derive(Debug, Serialize)]
struct InvestmentTypeInfo {
    name: &'static str,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16, data: Arc<HistoricalData>) -> io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(data);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "nestegg HTTP API listening");

    axum::serve(listener, app).await
}

fn router(data: Arc<HistoricalData>) -> Router {
    Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/investment-types", get(investment_types_handler))
        .fallback(not_found_handler)
        .with_state(data)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn investment_types_handler() -> Response {
    let types: Vec<InvestmentTypeInfo> = InvestmentType::ALL
        .into_iter()
        .map(|t| InvestmentTypeInfo {
            name: t.label(),
            description: t.description(),
        })
        .collect();
    json_response(StatusCode::OK, types)
}

async fn simulate_get_handler(
    State(data): State<Arc<HistoricalData>>,
    Query(payload): Query<SimulatePayload>,
) -> Response {
    simulate_handler_impl(data, payload).await
}

async fn simulate_post_handler(
    State(data): State<Arc<HistoricalData>>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    simulate_handler_impl(data, payload).await
}

async fn simulate_handler_impl(data: Arc<HistoricalData>, payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            tracing::debug!(error = %msg, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let job =
        tokio::task::spawn_blocking(move || simulate(&data, request.params, request.seed)).await;
    match job {
        Ok(Ok(output)) => json_response(StatusCode::OK, build_simulate_response(&output)),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "simulation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "simulation task panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation task failed")
        }
    }
}

fn build_simulate_response(output: &SimulationOutput) -> SimulateResponse<'_> {
    SimulateResponse {
        seed: output.seed,
        report: output.report(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
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
fn api_request_from_json(json: &str) -> std::result::Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> std::result::Result<ApiRequest, String> {
    let mut raw = default_parameters_for_api();

    if let Some(v) = payload.invest_type {
        raw.invest_type = v.parse().map_err(|e: crate::error::ValidationError| e.to_string())?;
    }
    if let Some(v) = payload.start_value {
        raw.start_value = v;
    }
    if let Some(v) = payload.withdrawal {
        raw.withdrawal = v;
    }
    if let Some(v) = payload.min_years {
        raw.min_years = v;
    }
    if let Some(v) = payload.most_likely_years {
        raw.most_likely_years = v;
    }
    if let Some(v) = payload.max_years {
        raw.max_years = v;
    }
    if let Some(v) = payload.num_sim {
        raw.num_sim = v;
    }

    if raw.num_sim > API_MAX_SIMULATIONS {
        return Err(format!("numSim must be <= {API_MAX_SIMULATIONS}"));
    }

    let params = SimulationParameters::validate(raw).map_err(|e| e.to_string())?;
    Ok(ApiRequest {
        params,
        seed: payload.seed.unwrap_or(API_DEFAULT_SEED),
    })
}

fn default_parameters_for_api() -> RawParameters {
    RawParameters {
        invest_type: InvestmentType::Stocks,
        start_value: 1_000_000,
        withdrawal: 40_000,
        min_years: 20,
        most_likely_years: 30,
        max_years: 40,
        num_sim: 3_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RateSeries;

    fn series(rates: &[f64]) -> RateSeries {
        RateSeries::new(rates.to_vec()).expect("non-empty series")
    }

    fn sample_data() -> HistoricalData {
        HistoricalData::from_series(
            series(&[0.4381, -0.083, -0.2512, -0.4384, -0.0864, 0.4998, -0.0119, 0.4674]),
            series(&[0.0084, 0.042, 0.0454, -0.0256, 0.0879, 0.0186, 0.0796, 0.0447]),
            series(&[0.2232, 0.0195, -0.1029, -0.232, 0.0007, 0.2592, 0.0338, 0.2561]),
            series(&[0.1932, 0.0252, -0.0741, -0.1798, 0.0162, 0.2101, 0.0405, 0.2094]),
            series(&[-0.0112, -0.0226, -0.0116, -0.0889, -0.1027, -0.0519, 0.0351, 0.0255]),
        )
    }

    #[test]
    fn api_request_defaults_are_valid() {
        let request = api_request_from_json("{}").expect("defaults should validate");
        assert_eq!(request.params.invest_type(), InvestmentType::Stocks);
        assert_eq!(request.params.num_sim(), 3_000);
        assert_eq!(request.seed, API_DEFAULT_SEED);
    }

    #[test]
    fn api_request_applies_overrides() {
        let request = api_request_from_json(
            r#"{"investType":"50_50_blend","startValue":500000,"withdrawal":25000,
                "minYears":15,"mostLikelyYears":25,"maxYears":35,"numSim":100,"seed":9}"#,
        )
        .expect("valid payload");
        assert_eq!(request.params.invest_type(), InvestmentType::Blend5050);
        assert_eq!(request.params.start_value(), 500_000);
        assert_eq!(request.params.max_years(), 35);
        assert_eq!(request.seed, 9);
    }

    #[test]
    fn api_request_rejects_invalid_values() {
        let err = api_request_from_json(r#"{"minYears":40,"maxYears":20}"#).expect_err("illogical");
        assert!(err.contains("illogical"));

        let err = api_request_from_json(r#"{"withdrawal":2000000}"#).expect_err("withdrawal");
        assert!(err.contains("withdrawal"));

        let err = api_request_from_json(r#"{"numSim":0}"#).expect_err("no runs");
        assert!(err.contains("simulations"));

        let err = api_request_from_json(r#"{"investType":"gold"}"#).expect_err("unknown type");
        assert!(err.contains("gold"));

        let err = api_request_from_json(r#"{"numSim":500000}"#).expect_err("too many runs");
        assert!(err.contains("numSim"));

        assert!(api_request_from_json("not json").is_err());
    }

    #[test]
    fn simulate_response_serializes_report_fields() {
        let request = api_request_from_json(r#"{"numSim":3500,"seed":3}"#).expect("valid");
        let output = simulate(&sample_data(), request.params, request.seed).expect("simulate");
        assert_eq!(output.result.outcomes.len(), 3_500);

        let json = serde_json::to_value(build_simulate_response(&output)).expect("serialize");
        assert_eq!(json["seed"], 3);
        assert_eq!(json["investType"], "stocks");
        assert_eq!(json["plottedOutcomes"].as_array().map(Vec::len), Some(3_000));
        let odds = json["statistics"]["oddsOfBankruptcy"]
            .as_f64()
            .expect("odds number");
        assert!((0.0..=100.0).contains(&odds));
    }

    #[test]
    fn simulate_is_deterministic_for_a_seed() {
        let data = sample_data();
        let request = api_request_from_json(r#"{"numSim":400,"seed":11}"#).expect("valid");
        let a = simulate(&data, request.params.clone(), request.seed).expect("simulate");
        let b = simulate(&data, request.params, request.seed).expect("simulate");
        assert_eq!(a.result, b.result);
        assert_eq!(a.statistics, b.statistics);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "nestegg",
            "run",
            "--invest-type",
            "40_50_10_blend",
            "--start-value",
            "750000",
            "--withdrawal",
            "30000",
            "--min-years",
            "10",
            "--most-likely-years",
            "25",
            "--max-years",
            "35",
            "--num-sim",
            "1000",
            "--seed",
            "5",
        ])
        .expect("valid args");

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let overrides = args.overrides();
        assert!(overrides.is_complete());
        assert_eq!(overrides.invest_type, Some(InvestmentType::Blend405010));
        assert_eq!(args.seed, Some(5));

        let params = Prompter::new(io::empty(), io::sink())
            .collect(overrides)
            .expect("complete overrides validate without prompting");
        assert_eq!(params.most_likely_years(), 25);
    }

    #[test]
    fn cli_parses_serve_with_default_port() {
        let cli = Cli::try_parse_from(["nestegg", "serve"]).expect("valid args");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn cli_rejects_unknown_investment_type() {
        assert!(Cli::try_parse_from(["nestegg", "run", "--invest-type", "gold"]).is_err());
    }
}
