use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    Annualization, AreaSource, CostBreakdown, DerivedQuantities, EngineConfig, EnginePreset,
    FeasibilityError, FeasibilityReport, LoanModel, MAX_DEVELOPMENT_MONTHS, Profitability,
    ProjectInputs, RevenueSource, SelfReferenceStrategy, StampDutyPolicy, TerminalFlow, evaluate,
};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    Standard,
    Leveraged,
}

impl From<Preset> for EnginePreset {
    fn from(value: Preset) -> Self {
        match value {
            Preset::Standard => EnginePreset::Standard,
            Preset::Leveraged => EnginePreset::Leveraged,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaMode {
    #[default]
    Planning,
    Measured,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevenueMode {
    #[default]
    SalesRate,
    Fixed,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StampDutyMode {
    #[default]
    Progressive,
    Flat,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfReferenceMode {
    #[default]
    Subtotal,
    FixedPoint,
}

impl From<SelfReferenceMode> for SelfReferenceStrategy {
    fn from(value: SelfReferenceMode) -> Self {
        match value {
            SelfReferenceMode::Subtotal => SelfReferenceStrategy::Subtotal,
            SelfReferenceMode::FixedPoint => SelfReferenceStrategy::FixedPoint,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalFlowMode {
    #[default]
    ProfitPlusEquity,
    ProfitOnly,
}

impl From<TerminalFlowMode> for TerminalFlow {
    fn from(value: TerminalFlowMode) -> Self {
        match value {
            TerminalFlowMode::ProfitPlusEquity => TerminalFlow::ProfitPlusEquity,
            TerminalFlowMode::ProfitOnly => TerminalFlow::ProfitOnly,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnualizationMode {
    #[default]
    Compound,
    Simple,
}

impl From<AnnualizationMode> for Annualization {
    fn from(value: AnnualizationMode) -> Self {
        match value {
            AnnualizationMode::Compound => Annualization::Compound,
            AnnualizationMode::Simple => Annualization::Simple,
        }
    }
}

/// Project parameters as entered by a person: money in dollars, rates in
/// percent.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FeasibilityArgs {
    #[arg(long, default_value = "", help = "Property address shown on reports")]
    pub address: String,
    #[arg(long, value_enum, default_value_t = Preset::Standard)]
    pub preset: Preset,
    #[arg(long, value_enum, default_value_t = SelfReferenceMode::Subtotal)]
    pub self_reference: SelfReferenceMode,
    #[arg(long, value_enum, default_value_t = TerminalFlowMode::ProfitPlusEquity)]
    pub terminal_flow: TerminalFlowMode,
    #[arg(long, value_enum, default_value_t = AnnualizationMode::Compound)]
    pub annualization: AnnualizationMode,
    #[arg(
        long,
        help = "Construction loan as a percent of build cost; replaces the preset's loan model"
    )]
    pub loan_fraction: Option<f64>,

    #[arg(long, default_value_t = 500_000.0)]
    pub site_price: f64,
    #[arg(long, value_enum, default_value_t = AreaMode::Planning)]
    pub area_mode: AreaMode,
    #[arg(long, default_value_t = 613.0, help = "Site area in sqm")]
    pub site_area: f64,
    #[arg(long, default_value_t = 0.7, help = "Floor space ratio, e.g. 0.7 for 0.7:1")]
    pub floor_space_ratio: f64,
    #[arg(long, default_value_t = 85.0, help = "NSA as a percent of GFA")]
    pub nsa_ratio: f64,
    #[arg(long, help = "Measured gross floor area in sqm (area-mode measured)")]
    pub gfa: Option<f64>,
    #[arg(long, help = "Measured net sellable area in sqm (area-mode measured)")]
    pub nsa: Option<f64>,
    #[arg(long, default_value_t = 2)]
    pub dwellings: u32,

    #[arg(long, value_enum, default_value_t = RevenueMode::SalesRate)]
    pub revenue_mode: RevenueMode,
    #[arg(long, default_value_t = 2_800.0, help = "Sales rate in $/sqm of NSA")]
    pub sales_rate: f64,
    #[arg(long, help = "Fixed expected revenue in dollars (revenue-mode fixed)")]
    pub revenue: Option<f64>,

    #[arg(long, default_value_t = 2_500.0, help = "Construction cost in $/sqm of GFA")]
    pub construction_cost_per_area: f64,
    #[arg(long, default_value_t = 20_000.0)]
    pub demolition_cost: f64,
    #[arg(long, default_value_t = 50_000.0)]
    pub consultant_costs: f64,
    #[arg(long, default_value_t = 5.0, help = "Consultants as a percent of build cost")]
    pub consultant_rate: f64,
    #[arg(long, default_value_t = 15_000.0)]
    pub marketing_costs: f64,
    #[arg(long, default_value_t = 1.5, help = "Marketing as a percent of revenue")]
    pub marketing_rate: f64,
    #[arg(long, default_value_t = 2.5)]
    pub agents_commission_rate: f64,

    #[arg(long, value_enum, default_value_t = StampDutyMode::Progressive)]
    pub stamp_duty_mode: StampDutyMode,
    #[arg(long, default_value_t = 5.5, help = "Flat stamp duty rate in percent")]
    pub stamp_duty_rate: f64,
    #[arg(long, default_value_t = 10.0)]
    pub gst_rate: f64,

    #[arg(long, default_value_t = 15_000.0)]
    pub council_fees: f64,
    #[arg(long, default_value_t = 5_000.0)]
    pub statutory_fees: f64,
    #[arg(long, default_value_t = 1.0, help = "Statutory fees as a percent of total costs")]
    pub statutory_fee_rate: f64,
    #[arg(long, default_value_t = 8_000.0)]
    pub legal_fees: f64,
    #[arg(long, default_value_t = 25_000.0)]
    pub professional_fees: f64,
    #[arg(long, default_value_t = 3_000.0)]
    pub solicitor_fees: f64,
    #[arg(long, default_value_t = 5_000.0)]
    pub insurance_costs: f64,
    #[arg(long, default_value_t = 8_000.0)]
    pub utilities_connection: f64,

    #[arg(long, default_value_t = 5.0)]
    pub contingency_rate: f64,
    #[arg(long, default_value_t = 6.5)]
    pub interest_rate: f64,
    #[arg(long, default_value_t = 70.0)]
    pub loan_to_value_ratio: f64,
    #[arg(long, default_value_t = 18)]
    pub development_period_months: u32,
    #[arg(long, default_value_t = 20.0)]
    pub target_profit_margin: f64,
    #[arg(long, default_value_t = 15.0)]
    pub minimum_roe: f64,
}

impl Default for FeasibilityArgs {
    fn default() -> Self {
        Self {
            address: String::new(),
            preset: Preset::Standard,
            self_reference: SelfReferenceMode::Subtotal,
            terminal_flow: TerminalFlowMode::ProfitPlusEquity,
            annualization: AnnualizationMode::Compound,
            loan_fraction: None,
            site_price: 500_000.0,
            area_mode: AreaMode::Planning,
            site_area: 613.0,
            floor_space_ratio: 0.7,
            nsa_ratio: 85.0,
            gfa: None,
            nsa: None,
            dwellings: 2,
            revenue_mode: RevenueMode::SalesRate,
            sales_rate: 2_800.0,
            revenue: None,
            construction_cost_per_area: 2_500.0,
            demolition_cost: 20_000.0,
            consultant_costs: 50_000.0,
            consultant_rate: 5.0,
            marketing_costs: 15_000.0,
            marketing_rate: 1.5,
            agents_commission_rate: 2.5,
            stamp_duty_mode: StampDutyMode::Progressive,
            stamp_duty_rate: 5.5,
            gst_rate: 10.0,
            council_fees: 15_000.0,
            statutory_fees: 5_000.0,
            statutory_fee_rate: 1.0,
            legal_fees: 8_000.0,
            professional_fees: 25_000.0,
            solicitor_fees: 3_000.0,
            insurance_costs: 5_000.0,
            utilities_connection: 8_000.0,
            contingency_rate: 5.0,
            interest_rate: 6.5,
            loan_to_value_ratio: 70.0,
            development_period_months: 18,
            target_profit_margin: 20.0,
            minimum_roe: 15.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FeasibilityPayload {
    address: Option<String>,
    preset: Option<Preset>,
    self_reference: Option<SelfReferenceMode>,
    terminal_flow: Option<TerminalFlowMode>,
    annualization: Option<AnnualizationMode>,
    loan_fraction: Option<f64>,

    site_price: Option<f64>,
    area_mode: Option<AreaMode>,
    site_area: Option<f64>,
    floor_space_ratio: Option<f64>,
    nsa_ratio: Option<f64>,
    gfa: Option<f64>,
    nsa: Option<f64>,
    dwellings: Option<u32>,

    revenue_mode: Option<RevenueMode>,
    sales_rate: Option<f64>,
    revenue: Option<f64>,

    construction_cost: Option<f64>,
    demolition_cost: Option<f64>,
    consultant_costs: Option<f64>,
    consultant_rate: Option<f64>,
    marketing_costs: Option<f64>,
    marketing_rate: Option<f64>,
    agents_commission: Option<f64>,

    stamp_duty_mode: Option<StampDutyMode>,
    stamp_duty_rate: Option<f64>,
    gst_rate: Option<f64>,

    council_fees: Option<f64>,
    statutory_fees: Option<f64>,
    statutory_fee_rate: Option<f64>,
    legal_fees: Option<f64>,
    professional_fees: Option<f64>,
    solicitor_fees: Option<f64>,
    insurance: Option<f64>,
    utilities: Option<f64>,

    contingency_rate: Option<f64>,
    interest_rate: Option<f64>,
    lvr: Option<f64>,
    development_months: Option<u32>,
    target_margin: Option<f64>,
    minimum_roe: Option<f64>,
}

/// Validated inputs plus the engine variant to run them through.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub preset: Preset,
    pub inputs: ProjectInputs,
    pub config: EngineConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeasibilityResponse {
    preset: Preset,
    derived: DerivedQuantities,
    costs: CostBreakdown,
    profitability: Profitability,
    report: FeasibilityReport,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn check_amount(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{flag} must be a finite value >= 0"));
    }
    Ok(())
}

fn check_percent(flag: &str, value: f64) -> Result<(), String> {
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("{flag} must be between 0 and 100"));
    }
    Ok(())
}

pub fn build_request(args: &FeasibilityArgs) -> Result<EvaluationRequest, String> {
    for (flag, value) in [
        ("--site-price", args.site_price),
        ("--construction-cost-per-area", args.construction_cost_per_area),
        ("--demolition-cost", args.demolition_cost),
        ("--consultant-costs", args.consultant_costs),
        ("--marketing-costs", args.marketing_costs),
        ("--council-fees", args.council_fees),
        ("--statutory-fees", args.statutory_fees),
        ("--legal-fees", args.legal_fees),
        ("--professional-fees", args.professional_fees),
        ("--solicitor-fees", args.solicitor_fees),
        ("--insurance-costs", args.insurance_costs),
        ("--utilities-connection", args.utilities_connection),
    ] {
        check_amount(flag, value)?;
    }

    for (flag, value) in [
        ("--consultant-rate", args.consultant_rate),
        ("--marketing-rate", args.marketing_rate),
        ("--agents-commission-rate", args.agents_commission_rate),
        ("--stamp-duty-rate", args.stamp_duty_rate),
        ("--gst-rate", args.gst_rate),
        ("--statutory-fee-rate", args.statutory_fee_rate),
        ("--contingency-rate", args.contingency_rate),
        ("--interest-rate", args.interest_rate),
        ("--loan-to-value-ratio", args.loan_to_value_ratio),
        ("--target-profit-margin", args.target_profit_margin),
        ("--minimum-roe", args.minimum_roe),
    ] {
        check_percent(flag, value)?;
    }

    if args.dwellings == 0 {
        return Err("--dwellings must be >= 1".to_string());
    }
    if !(1..=MAX_DEVELOPMENT_MONTHS).contains(&args.development_period_months) {
        return Err(format!(
            "--development-period-months must be between 1 and {MAX_DEVELOPMENT_MONTHS}"
        ));
    }

    let area_source = match args.area_mode {
        AreaMode::Planning => {
            check_amount("--site-area", args.site_area)?;
            check_amount("--floor-space-ratio", args.floor_space_ratio)?;
            check_percent("--nsa-ratio", args.nsa_ratio)?;
            AreaSource::Planning {
                site_area: args.site_area,
                floor_space_ratio: args.floor_space_ratio,
                nsa_ratio: args.nsa_ratio / 100.0,
            }
        }
        AreaMode::Measured => {
            let Some(gfa) = args.gfa else {
                return Err("--gfa is required when --area-mode is measured".to_string());
            };
            let Some(nsa) = args.nsa else {
                return Err("--nsa is required when --area-mode is measured".to_string());
            };
            check_amount("--gfa", gfa)?;
            check_amount("--nsa", nsa)?;
            if nsa > gfa {
                return Err("--nsa must be <= --gfa".to_string());
            }
            AreaSource::Measured { gfa, nsa }
        }
    };

    let revenue_source = match args.revenue_mode {
        RevenueMode::SalesRate => {
            check_amount("--sales-rate", args.sales_rate)?;
            RevenueSource::SalesRate {
                rate_per_area: args.sales_rate,
            }
        }
        RevenueMode::Fixed => {
            let Some(amount) = args.revenue else {
                return Err("--revenue is required when --revenue-mode is fixed".to_string());
            };
            check_amount("--revenue", amount)?;
            RevenueSource::Fixed { amount }
        }
    };

    let stamp_duty = match args.stamp_duty_mode {
        StampDutyMode::Progressive => StampDutyPolicy::default(),
        StampDutyMode::Flat => StampDutyPolicy::FlatRate {
            rate: args.stamp_duty_rate / 100.0,
        },
    };

    let mut config = EngineConfig::from_preset(args.preset.into());
    config.self_reference = args.self_reference.into();
    config.irr.terminal_flow = args.terminal_flow.into();
    config.irr.annualization = args.annualization.into();
    if let Some(fraction) = args.loan_fraction {
        check_amount("--loan-fraction", fraction)?;
        config.loan_model = LoanModel::ConstructionOnly {
            fraction: fraction / 100.0,
        };
    }

    let inputs = ProjectInputs {
        address: args.address.trim().to_string(),
        site_price: args.site_price,
        area_source,
        dwellings: args.dwellings,
        revenue_source,
        construction_cost_per_area: args.construction_cost_per_area,
        demolition_cost: args.demolition_cost,
        consultant_costs: args.consultant_costs,
        consultant_rate: args.consultant_rate / 100.0,
        marketing_costs: args.marketing_costs,
        marketing_rate: args.marketing_rate / 100.0,
        agents_commission_rate: args.agents_commission_rate / 100.0,
        stamp_duty,
        gst_rate: args.gst_rate / 100.0,
        council_fees: args.council_fees,
        statutory_fees: args.statutory_fees,
        statutory_fee_rate: args.statutory_fee_rate / 100.0,
        legal_fees: args.legal_fees,
        professional_fees: args.professional_fees,
        solicitor_fees: args.solicitor_fees,
        insurance_costs: args.insurance_costs,
        utilities_connection: args.utilities_connection,
        contingency_rate: args.contingency_rate / 100.0,
        interest_rate: args.interest_rate / 100.0,
        loan_to_value_ratio: args.loan_to_value_ratio / 100.0,
        development_period_months: args.development_period_months,
        target_profit_margin: args.target_profit_margin / 100.0,
        minimum_roe: args.minimum_roe / 100.0,
    };
    inputs.validate().map_err(|e| e.to_string())?;

    Ok(EvaluationRequest {
        preset: args.preset,
        inputs,
        config,
    })
}

/// Runs the engine and assembles the report for a validated request.
pub fn run_evaluation(request: &EvaluationRequest) -> Result<FeasibilityReport, FeasibilityError> {
    let result = evaluate(&request.inputs, &request.config)?;
    Ok(FeasibilityReport::build(&request.inputs, &result))
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/feasibility",
            get(feasibility_get_handler).post(feasibility_post_handler),
        )
        .route(
            "/api/feasibility/report.txt",
            get(report_text_get_handler).post(report_text_post_handler),
        )
        .route(
            "/api/feasibility/report.csv",
            get(report_csv_get_handler).post(report_csv_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "feasibility HTTP API listening");
    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn feasibility_get_handler(Query(payload): Query<FeasibilityPayload>) -> Response {
    feasibility_handler_impl(payload)
}

async fn feasibility_post_handler(Json(payload): Json<FeasibilityPayload>) -> Response {
    feasibility_handler_impl(payload)
}

async fn report_text_get_handler(Query(payload): Query<FeasibilityPayload>) -> Response {
    report_text_handler_impl(payload)
}

async fn report_text_post_handler(Json(payload): Json<FeasibilityPayload>) -> Response {
    report_text_handler_impl(payload)
}

async fn report_csv_get_handler(Query(payload): Query<FeasibilityPayload>) -> Response {
    report_csv_handler_impl(payload)
}

async fn report_csv_post_handler(Json(payload): Json<FeasibilityPayload>) -> Response {
    report_csv_handler_impl(payload)
}

fn feasibility_handler_impl(payload: FeasibilityPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return reject(&msg),
    };
    let result = match evaluate(&request.inputs, &request.config) {
        Ok(result) => result,
        Err(err) => return reject(&err.to_string()),
    };
    debug!(preset = ?request.preset, profit = result.profitability.profit, "feasibility evaluated");

    let report = FeasibilityReport::build(&request.inputs, &result);
    json_response(
        StatusCode::OK,
        FeasibilityResponse {
            preset: request.preset,
            derived: result.derived,
            costs: result.costs,
            profitability: result.profitability,
            report,
        },
    )
}

fn report_text_handler_impl(payload: FeasibilityPayload) -> Response {
    let report = match report_from_payload(payload) {
        Ok(report) => report,
        Err(msg) => return reject(&msg),
    };
    with_cache_control((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report.to_text(),
    ))
}

fn report_csv_handler_impl(payload: FeasibilityPayload) -> Response {
    let report = match report_from_payload(payload) {
        Ok(report) => report,
        Err(msg) => return reject(&msg),
    };
    match report.to_csv() {
        Ok(body) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"property_feasibility_report.csv\"",
                ),
            ],
            body,
        )),
        Err(err) => {
            warn!(error = %err, "csv export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn report_from_payload(payload: FeasibilityPayload) -> Result<FeasibilityReport, String> {
    let request = api_request_from_payload(payload)?;
    run_evaluation(&request).map_err(|e| e.to_string())
}

fn reject(msg: &str) -> Response {
    debug!(reason = msg, "rejected feasibility request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
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
fn api_request_from_json(json: &str) -> Result<EvaluationRequest, String> {
    let payload = serde_json::from_str::<FeasibilityPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: FeasibilityPayload) -> Result<EvaluationRequest, String> {
    let mut args = FeasibilityArgs::default();

    if let Some(v) = payload.address {
        args.address = v;
    }
    if let Some(v) = payload.preset {
        args.preset = v;
    }
    if let Some(v) = payload.self_reference {
        args.self_reference = v;
    }
    if let Some(v) = payload.terminal_flow {
        args.terminal_flow = v;
    }
    if let Some(v) = payload.annualization {
        args.annualization = v;
    }
    if payload.loan_fraction.is_some() {
        args.loan_fraction = payload.loan_fraction;
    }

    if let Some(v) = payload.site_price {
        args.site_price = v;
    }
    if let Some(v) = payload.area_mode {
        args.area_mode = v;
    }
    if let Some(v) = payload.site_area {
        args.site_area = v;
    }
    if let Some(v) = payload.floor_space_ratio {
        args.floor_space_ratio = v;
    }
    if let Some(v) = payload.nsa_ratio {
        args.nsa_ratio = v;
    }
    if payload.gfa.is_some() {
        args.gfa = payload.gfa;
    }
    if payload.nsa.is_some() {
        args.nsa = payload.nsa;
    }
    if let Some(v) = payload.dwellings {
        args.dwellings = v;
    }

    if let Some(v) = payload.revenue_mode {
        args.revenue_mode = v;
    }
    if let Some(v) = payload.sales_rate {
        args.sales_rate = v;
    }
    if payload.revenue.is_some() {
        args.revenue = payload.revenue;
    }

    if let Some(v) = payload.construction_cost {
        args.construction_cost_per_area = v;
    }
    if let Some(v) = payload.demolition_cost {
        args.demolition_cost = v;
    }
    if let Some(v) = payload.consultant_costs {
        args.consultant_costs = v;
    }
    if let Some(v) = payload.consultant_rate {
        args.consultant_rate = v;
    }
    if let Some(v) = payload.marketing_costs {
        args.marketing_costs = v;
    }
    if let Some(v) = payload.marketing_rate {
        args.marketing_rate = v;
    }
    if let Some(v) = payload.agents_commission {
        args.agents_commission_rate = v;
    }

    if let Some(v) = payload.stamp_duty_mode {
        args.stamp_duty_mode = v;
    }
    if let Some(v) = payload.stamp_duty_rate {
        args.stamp_duty_rate = v;
    }
    if let Some(v) = payload.gst_rate {
        args.gst_rate = v;
    }

    if let Some(v) = payload.council_fees {
        args.council_fees = v;
    }
    if let Some(v) = payload.statutory_fees {
        args.statutory_fees = v;
    }
    if let Some(v) = payload.statutory_fee_rate {
        args.statutory_fee_rate = v;
    }
    if let Some(v) = payload.legal_fees {
        args.legal_fees = v;
    }
    if let Some(v) = payload.professional_fees {
        args.professional_fees = v;
    }
    if let Some(v) = payload.solicitor_fees {
        args.solicitor_fees = v;
    }
    if let Some(v) = payload.insurance {
        args.insurance_costs = v;
    }
    if let Some(v) = payload.utilities {
        args.utilities_connection = v;
    }

    if let Some(v) = payload.contingency_rate {
        args.contingency_rate = v;
    }
    if let Some(v) = payload.interest_rate {
        args.interest_rate = v;
    }
    if let Some(v) = payload.lvr {
        args.loan_to_value_ratio = v;
    }
    if let Some(v) = payload.development_months {
        args.development_period_months = v;
    }
    if let Some(v) = payload.target_margin {
        args.target_profit_margin = v;
    }
    if let Some(v) = payload.minimum_roe {
        args.minimum_roe = v;
    }

    build_request(&args)
}
