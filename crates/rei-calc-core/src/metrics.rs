use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::InvestmentAssumptions;
use crate::pro_forma::{year_one_returns, YearOneReturns};
use crate::projection::{
    compute_five_year_returns, compute_projection, CumulativeReturns, ProFormaYear,
    DISPLAY_PROJECTION_YEARS,
};
use crate::types::{guarded_percent, with_metadata, ComputationOutput, Money, Percent};
use crate::ReiCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Headline ratios shown on listing cards and detail pages.
///
/// Values carry full precision; rounding is left to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// (annual rent − operating expenses) / price
    pub cap_rate_percent: Percent,
    /// annual rent / price
    pub gross_yield_percent: Percent,
    /// Year-1 cash flow over the down payment alone
    pub cash_on_cash_percent: Percent,
    /// Year-1 total return over down payment plus closing costs
    pub year_one_roi_percent: Percent,
    /// 5-year total return over down payment plus closing costs
    pub five_year_total_return_percent: Percent,
}

/// Everything a listing detail page renders, from one set of assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub metrics: ReturnMetrics,
    pub annual_noi: Money,
    pub year_one: YearOneReturns,
    pub projection: Vec<ProFormaYear>,
    pub five_year: CumulativeReturns,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the display ratios for a property.
pub fn compute_display_metrics(
    input: &InvestmentAssumptions,
) -> ReiCalcResult<ComputationOutput<ReturnMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let year_one = year_one_returns(input)?;
    let five_year = compute_five_year_returns(input)?;
    let metrics = build_metrics(input, &year_one, &five_year)?;
    log::debug!(
        "display metrics: cap={}% coc={}% roi={}%",
        metrics.cap_rate_percent,
        metrics.cash_on_cash_percent,
        metrics.year_one_roi_percent
    );

    metric_warnings(input, &metrics, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Return Metrics (cap rate, gross yield, cash-on-cash, ROI)",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

/// Metrics, year-1 breakdown, display projection and 5-year returns in one
/// pass.
pub fn analyze_investment(
    input: &InvestmentAssumptions,
) -> ReiCalcResult<ComputationOutput<InvestmentAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let year_one = year_one_returns(input)?;
    let five_year = compute_five_year_returns(input)?;
    let projection = compute_projection(input, &DISPLAY_PROJECTION_YEARS)?;
    let metrics = build_metrics(input, &year_one, &five_year)?;

    metric_warnings(input, &metrics, &mut warnings);
    if year_one.annual_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative year-1 cash flow of {:.2}; rent does not cover expenses and debt service",
            year_one.annual_cash_flow
        ));
    }

    let output = InvestmentAnalysis {
        annual_noi: annual_noi(input),
        metrics,
        year_one,
        projection,
        five_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental Property Investment Analysis",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Annual rent minus annual operating expenses; debt service excluded.
fn annual_noi(input: &InvestmentAssumptions) -> Money {
    input.operating.annual_rent() - input.operating.annual_operating_expenses()
}

fn build_metrics(
    input: &InvestmentAssumptions,
    year_one: &YearOneReturns,
    five_year: &CumulativeReturns,
) -> ReiCalcResult<ReturnMetrics> {
    let purchase_price = input.financing.purchase_price;

    Ok(ReturnMetrics {
        cap_rate_percent: guarded_percent(annual_noi(input), purchase_price, "purchase_price")?,
        gross_yield_percent: guarded_percent(
            input.operating.annual_rent(),
            purchase_price,
            "purchase_price",
        )?,
        // Down payment only; year-1 ROI below uses the full cash investment
        cash_on_cash_percent: guarded_percent(
            year_one.annual_cash_flow,
            year_one.down_payment_amount,
            "down_payment_percent",
        )?,
        year_one_roi_percent: year_one.return_on_cash_invested_percent,
        five_year_total_return_percent: five_year.return_on_cash_invested_percent,
    })
}

fn metric_warnings(input: &InvestmentAssumptions, metrics: &ReturnMetrics, warnings: &mut Vec<String>) {
    if input.financing.purchase_price.is_zero() {
        warnings.push("Purchase price is 0; cap rate and gross yield reported as 0%".into());
        return;
    }
    if metrics.cap_rate_percent < dec!(3) {
        warnings.push(format!(
            "Cap rate {:.2}% is below 3%; unusually low, verify rent and expenses",
            metrics.cap_rate_percent
        ));
    }
    if metrics.cap_rate_percent > dec!(12) {
        warnings.push(format!(
            "Cap rate {:.2}% exceeds 12%; unusually high, may indicate elevated risk",
            metrics.cap_rate_percent
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
