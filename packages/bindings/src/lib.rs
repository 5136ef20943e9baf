use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use rei_calc_core::listing::ListingAnalysisRequest;
use rei_calc_core::{EngineConfig, FinancingAssumptions, InvestmentAssumptions};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_assumptions(input_json: &str) -> NapiResult<InvestmentAssumptions> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: FinancingAssumptions = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rei_calc_core::amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn year_one_returns(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    let output = rei_calc_core::pro_forma::compute_year_one(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Projection request: the assumptions plus the years to project.
#[derive(Deserialize)]
struct ProjectionRequest {
    #[serde(flatten)]
    assumptions: InvestmentAssumptions,
    #[serde(default = "display_years")]
    years: Vec<u32>,
}

fn display_years() -> Vec<u32> {
    rei_calc_core::projection::DISPLAY_PROJECTION_YEARS.to_vec()
}

#[napi]
pub fn project_pro_forma(input_json: String) -> NapiResult<String> {
    let request: ProjectionRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rei_calc_core::projection::project_pro_forma(&request.assumptions, &request.years)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Cumulative request: the assumptions plus a holding period (5 years if absent).
#[derive(Deserialize)]
struct CumulativeRequest {
    #[serde(flatten)]
    assumptions: InvestmentAssumptions,
    #[serde(default = "five_year_horizon")]
    horizon_years: u32,
}

fn five_year_horizon() -> u32 {
    rei_calc_core::projection::FIVE_YEAR_HORIZON
}

#[napi]
pub fn cumulative_returns(input_json: String) -> NapiResult<String> {
    let request: CumulativeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rei_calc_core::projection::project_cumulative_returns(
        &request.assumptions,
        request.horizon_years,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn display_metrics(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    let output =
        rei_calc_core::metrics::compute_display_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    let output = rei_calc_core::metrics::analyze_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// `config_json` is an engine config document; national averages and the
/// default tax policy apply when it is absent.
#[napi]
pub fn analyze_listing(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let request: ListingAnalysisRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config: EngineConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    let output =
        rei_calc_core::listing::analyze_listing(&request.listing, &config, &request.overrides)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
