use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{
    FinancingAssumptions, InvestmentAssumptions, MarketAssumptions, OperatingAssumptions,
    PropertyValuation,
};
use crate::config::EngineConfig;
use crate::metrics::{analyze_investment, InvestmentAnalysis};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::ReiCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A property record as stored by the listings backend. Expense columns are
/// monthly; absent money columns read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Listing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "zip")]
    pub postal_code: Option<String>,
    pub price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baths: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqft: Option<u32>,
    pub estimated_rent: Money,
    pub expense_tax: Money,
    pub expense_insurance: Money,
    pub expense_maintenance: Money,
    pub expense_management: Money,
    pub expense_hoa: Money,
    pub expense_utilities: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_costs_percentage: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_market_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stabilized_market_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_rehab_cost: Option<Money>,
}

/// Calculator inputs adjusted by the visitor. Each field replaces the
/// listing or city default it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment_percent: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate_percent: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_costs_percent: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_appreciation_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rent_growth_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_expense_inflation_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_capex_reserve: Option<Money>,
}

/// CLI / bindings request shape: a listing plus optional overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingAnalysisRequest {
    pub listing: Listing,
    #[serde(default)]
    pub overrides: AssumptionOverrides,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve a listing into calculation inputs.
///
/// Each rate is taken from the overrides first, then the listing (closing
/// costs only), then the city defaults for the listing's location.
pub fn assumptions_for_listing(
    listing: &Listing,
    config: &EngineConfig,
    overrides: &AssumptionOverrides,
) -> ReiCalcResult<InvestmentAssumptions> {
    config.validate()?;
    let defaults = config
        .city_table()
        .lookup(listing.city.as_deref(), listing.postal_code.as_deref());
    log::debug!(
        "listing {:?}: using defaults for '{}'",
        listing.id,
        defaults.city
    );

    let financing = FinancingAssumptions {
        purchase_price: listing.price,
        down_payment_percent: overrides
            .down_payment_percent
            .unwrap_or(defaults.down_payment_percent),
        interest_rate_annual_percent: overrides
            .interest_rate_percent
            .unwrap_or(defaults.interest_rate_percent),
        loan_term_years: overrides.loan_term_years.unwrap_or(defaults.loan_term_years),
    };

    let operating = OperatingAssumptions {
        monthly_rent: overrides.monthly_rent.unwrap_or(listing.estimated_rent),
        monthly_expense_tax: listing.expense_tax,
        monthly_expense_insurance: listing.expense_insurance,
        monthly_expense_maintenance: listing.expense_maintenance,
        monthly_expense_management: listing.expense_management,
        monthly_expense_hoa: listing.expense_hoa,
        monthly_expense_utilities: listing.expense_utilities,
        monthly_expense_other: Decimal::ZERO,
        monthly_capex_reserve: overrides.monthly_capex_reserve.unwrap_or(Decimal::ZERO),
    };

    let market = MarketAssumptions {
        closing_costs_percent: overrides
            .closing_costs_percent
            .or(listing.closing_costs_percentage)
            .unwrap_or(defaults.closing_costs_percent),
        annual_appreciation_rate: overrides
            .annual_appreciation_rate
            .unwrap_or(defaults.annual_appreciation_rate),
        annual_rent_growth_rate: overrides
            .annual_rent_growth_rate
            .unwrap_or(defaults.annual_rent_growth_rate),
        annual_expense_inflation_rate: overrides
            .annual_expense_inflation_rate
            .unwrap_or(defaults.annual_expense_inflation_rate),
        vacancy_rate: overrides.vacancy_rate.unwrap_or(defaults.vacancy_rate),
        tax_policy: config.tax_policy.clone(),
    };

    let valuation = listing.valuation();

    let assumptions = InvestmentAssumptions {
        financing,
        operating,
        market,
        valuation,
    };
    assumptions.validate()?;
    Ok(assumptions)
}

/// Resolve and analyse a listing in one call.
pub fn analyze_listing(
    listing: &Listing,
    config: &EngineConfig,
    overrides: &AssumptionOverrides,
) -> ReiCalcResult<ComputationOutput<InvestmentAnalysis>> {
    let start = Instant::now();

    let assumptions = assumptions_for_listing(listing, config, overrides)?;
    let analysis = analyze_investment(&assumptions)?;

    let mut warnings = analysis.warnings;
    if listing.estimated_rent.is_zero() && overrides.monthly_rent.is_none() {
        warnings.push("Listing has no estimated rent; income metrics are 0".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Rental Property Investment Analysis (listing with locality defaults)",
        &assumptions,
        warnings,
        elapsed,
        analysis.result,
    ))
}

impl Listing {
    /// Valuation enrichment, present only when the listing carries any of
    /// the valuation columns.
    pub fn valuation(&self) -> Option<PropertyValuation> {
        if self.estimated_market_value.is_none()
            && self.stabilized_market_value.is_none()
            && self.estimated_rehab_cost.is_none()
        {
            return None;
        }
        Some(PropertyValuation {
            estimated_market_value: self.estimated_market_value,
            stabilized_market_value: self.stabilized_market_value,
            estimated_rehab_cost: self.estimated_rehab_cost,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
