use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::Amortization;
use crate::assumptions::InvestmentAssumptions;
use crate::types::{guarded_percent, with_metadata, ComputationOutput, Money, Percent};
use crate::ReiCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// First-year ("day-1") return breakdown for a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOneReturns {
    pub down_payment_amount: Money,
    pub loan_amount: Money,
    pub closing_costs: Money,
    /// Down payment plus closing costs
    pub cash_investment: Money,
    pub monthly_mortgage: Money,
    pub annual_debt_service: Money,
    pub annual_rent: Money,
    pub annual_operating_expenses: Money,
    /// Rent minus operating expenses minus debt service (no vacancy)
    pub annual_cash_flow: Money,
    /// Year-1 principal, approximated as payments minus simple interest on
    /// the original balance
    pub annual_loan_paydown: Money,
    /// Reported for display; not part of the year-1 total
    pub annual_appreciation: Money,
    pub annual_depreciation: Money,
    pub tax_savings: Money,
    pub built_in_equity: Money,
    /// Cash flow + loan paydown + built-in equity
    pub total_annual_return: Money,
    pub total_annual_return_with_tax: Money,
    pub return_on_cash_invested_percent: Percent,
    pub return_on_cash_invested_with_tax_percent: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the year-1 pro-forma returns.
///
/// Appreciation is reported but excluded from `total_annual_return`: the
/// year-1 view counts only cash flow, principal paydown and the equity
/// present at acquisition.
pub fn compute_year_one(
    input: &InvestmentAssumptions,
) -> ReiCalcResult<ComputationOutput<YearOneReturns>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.validate()?;
    let output = build_year_one(input)?;
    log::debug!(
        "year one: cash_investment={} total_return={} roi={}%",
        output.cash_investment,
        output.total_annual_return,
        output.return_on_cash_invested_percent
    );

    collect_warnings(input, &output, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Year-1 Pro-Forma (cash flow + loan paydown + built-in equity)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Year-1 returns without the output envelope.
pub fn year_one_returns(input: &InvestmentAssumptions) -> ReiCalcResult<YearOneReturns> {
    input.validate()?;
    build_year_one(input)
}

fn build_year_one(input: &InvestmentAssumptions) -> ReiCalcResult<YearOneReturns> {
    let financing = &input.financing;
    let purchase_price = financing.purchase_price;

    // --- Acquisition ---
    let down_payment_amount = financing.down_payment_amount();
    let loan_amount = financing.loan_amount();
    let closing_costs = input.closing_costs();
    let cash_investment = down_payment_amount + closing_costs;

    // --- Debt service ---
    let schedule = Amortization::from_financing(financing)?;
    let monthly_mortgage = schedule.monthly_payment;
    let annual_debt_service = schedule.annual_debt_service();

    // --- Operations ---
    let annual_rent = input.operating.annual_rent();
    let annual_operating_expenses = input.operating.annual_operating_expenses();
    let annual_cash_flow = annual_rent - annual_operating_expenses - annual_debt_service;

    // First-order paydown: simple annual interest on the original balance
    let annual_loan_paydown = annual_debt_service
        - loan_amount * financing.interest_rate_annual_percent / Decimal::ONE_HUNDRED;

    let annual_appreciation = purchase_price * input.market.annual_appreciation_rate;

    // --- Depreciation tax shield ---
    let annual_depreciation = input.market.annual_depreciation(purchase_price);
    let tax_savings = input.market.annual_tax_savings(purchase_price);

    let built_in_equity = input.built_in_equity();

    let total_annual_return = annual_cash_flow + annual_loan_paydown + built_in_equity;
    let total_annual_return_with_tax = total_annual_return + tax_savings;

    Ok(YearOneReturns {
        down_payment_amount,
        loan_amount,
        closing_costs,
        cash_investment,
        monthly_mortgage,
        annual_debt_service,
        annual_rent,
        annual_operating_expenses,
        annual_cash_flow,
        annual_loan_paydown,
        annual_appreciation,
        annual_depreciation,
        tax_savings,
        built_in_equity,
        total_annual_return,
        total_annual_return_with_tax,
        return_on_cash_invested_percent: guarded_percent(
            total_annual_return,
            cash_investment,
            "cash_investment",
        )?,
        return_on_cash_invested_with_tax_percent: guarded_percent(
            total_annual_return_with_tax,
            cash_investment,
            "cash_investment",
        )?,
    })
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(
    input: &InvestmentAssumptions,
    output: &YearOneReturns,
    warnings: &mut Vec<String>,
) {
    if output.annual_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative year-1 cash flow of {:.2}; rent does not cover expenses and debt service",
            output.annual_cash_flow
        ));
    }

    if input.market.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15%; above typical market norms",
            input.market.vacancy_rate * dec!(100)
        ));
    }

    if input.financing.down_payment_percent < dec!(20) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80%; high leverage",
            Decimal::ONE_HUNDRED - input.financing.down_payment_percent
        ));
    }

    if output.cash_investment.is_zero() {
        warnings.push("No cash invested; return on cash invested reported as 0%".into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
