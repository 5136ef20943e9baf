use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::Amortization;
use crate::assumptions::InvestmentAssumptions;
use crate::error::ReiCalcError;
use crate::types::{
    guarded_percent, in_range, with_metadata, ComputationOutput, Money, Percent, Rate,
};
use crate::ReiCalcResult;

/// Years shown on a listing's pro-forma table.
pub const DISPLAY_PROJECTION_YEARS: [u32; 4] = [1, 2, 3, 5];

/// Holding period behind the headline cumulative return.
pub const FIVE_YEAR_HORIZON: u32 = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projected income statement for one year of ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProFormaYear {
    pub year: u32,
    pub gross_potential_rent: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    pub operating_expenses: Money,
    pub net_operating_income: Money,
    pub debt_service: Money,
    pub cash_flow: Money,
}

/// Requested pro-forma rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub years: Vec<ProFormaYear>,
}

/// Total return over a holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeReturns {
    pub horizon_years: u32,
    pub cash_investment: Money,
    pub cumulative_cash_flow: Money,
    pub cumulative_principal_paid: Money,
    /// Purchase price compounded at the appreciation rate
    pub future_value: Money,
    pub total_appreciation: Money,
    pub built_in_equity: Money,
    pub cumulative_tax_savings: Money,
    pub total_cumulative_return: Money,
    pub total_cumulative_return_with_tax: Money,
    pub return_on_cash_invested_percent: Percent,
    pub return_on_cash_invested_with_tax_percent: Percent,
    /// Compound annual rate equivalent to the total return on cash invested
    pub annualized_return_percent: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project rent, vacancy, expenses and NOI for each requested year.
///
/// Years need not be contiguous and are returned in the order requested.
/// Rent and expenses grow independently from the year-1 base; debt service
/// is held constant (fixed-rate loan, no refinancing).
pub fn compute_projection(
    input: &InvestmentAssumptions,
    years: &[u32],
) -> ReiCalcResult<Vec<ProFormaYear>> {
    input.validate()?;
    validate_years(years)?;

    let debt_service = Amortization::from_financing(&input.financing)?.annual_debt_service();
    years
        .iter()
        .map(|&year| project_year(input, year, debt_service, "years"))
        .collect()
}

/// Enveloped pro-forma projection.
pub fn project_pro_forma(
    input: &InvestmentAssumptions,
    years: &[u32],
) -> ReiCalcResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let rows = compute_projection(input, years)?;
    log::debug!("projection: {} years requested", rows.len());

    for row in &rows {
        if row.cash_flow < Decimal::ZERO {
            warnings.push(format!(
                "Year {} projects negative cash flow of {:.2}",
                row.year, row.cash_flow
            ));
        }
    }

    if input.market.annual_expense_inflation_rate > input.market.annual_rent_growth_rate {
        warnings.push(
            "Expense inflation exceeds rent growth; NOI erodes over the projection".into(),
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Multi-Year Pro-Forma (independent rent growth and expense inflation)",
        input,
        warnings,
        elapsed,
        ProjectionOutput { years: rows },
    ))
}

/// Cumulative cash flow, principal paydown, appreciation and tax savings
/// over `horizon_years`.
pub fn compute_cumulative_returns(
    input: &InvestmentAssumptions,
    horizon_years: u32,
) -> ReiCalcResult<CumulativeReturns> {
    input.validate()?;
    if horizon_years == 0 {
        return Err(ReiCalcError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Holding period must be at least 1 year".into(),
        });
    }

    let financing = &input.financing;
    let purchase_price = financing.purchase_price;
    let cash_investment = input.cash_investment();

    let schedule = Amortization::from_financing(financing)?;
    let debt_service = schedule.annual_debt_service();

    let mut cumulative_cash_flow = Decimal::ZERO;
    for year in 1..=horizon_years {
        let row = project_year(input, year, debt_service, "horizon_years")?;
        cumulative_cash_flow = in_range(
            cumulative_cash_flow.checked_add(row.cash_flow),
            "horizon_years",
        )?;
    }

    // Month-by-month principal; a loan shorter than the horizon is fully repaid
    let months = horizon_years.saturating_mul(12).min(schedule.total_periods);
    let cumulative_principal_paid = schedule.cumulative_principal_paid(months)?;

    let appreciation_factor = growth_factor(
        input.market.annual_appreciation_rate,
        horizon_years,
        "horizon_years",
    )?;
    let future_value = in_range(purchase_price.checked_mul(appreciation_factor), "horizon_years")?;
    let total_appreciation = future_value - purchase_price;

    let built_in_equity = input.built_in_equity();
    let cumulative_tax_savings = in_range(
        input
            .market
            .annual_tax_savings(purchase_price)
            .checked_mul(Decimal::from(horizon_years)),
        "horizon_years",
    )?;

    let total_cumulative_return = in_range(
        cumulative_cash_flow
            .checked_add(cumulative_principal_paid)
            .and_then(|v| v.checked_add(total_appreciation))
            .and_then(|v| v.checked_add(built_in_equity)),
        "horizon_years",
    )?;
    let total_cumulative_return_with_tax = in_range(
        total_cumulative_return.checked_add(cumulative_tax_savings),
        "horizon_years",
    )?;

    let annualized_return_percent =
        annualized_percent(total_cumulative_return, cash_investment, horizon_years);

    Ok(CumulativeReturns {
        horizon_years,
        cash_investment,
        cumulative_cash_flow,
        cumulative_principal_paid,
        future_value,
        total_appreciation,
        built_in_equity,
        cumulative_tax_savings,
        total_cumulative_return,
        total_cumulative_return_with_tax,
        return_on_cash_invested_percent: guarded_percent(
            total_cumulative_return,
            cash_investment,
            "cash_investment",
        )?,
        return_on_cash_invested_with_tax_percent: guarded_percent(
            total_cumulative_return_with_tax,
            cash_investment,
            "cash_investment",
        )?,
        annualized_return_percent,
    })
}

/// The 5-year holding-period returns shown on listing pages.
pub fn compute_five_year_returns(input: &InvestmentAssumptions) -> ReiCalcResult<CumulativeReturns> {
    compute_cumulative_returns(input, FIVE_YEAR_HORIZON)
}

/// Enveloped cumulative returns.
pub fn project_cumulative_returns(
    input: &InvestmentAssumptions,
    horizon_years: u32,
) -> ReiCalcResult<ComputationOutput<CumulativeReturns>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = compute_cumulative_returns(input, horizon_years)?;
    log::debug!(
        "cumulative returns: horizon={} total={} roi={}%",
        output.horizon_years,
        output.total_cumulative_return,
        output.return_on_cash_invested_percent
    );

    if output.cumulative_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Cumulative cash flow over {} years is negative ({:.2})",
            horizon_years, output.cumulative_cash_flow
        ));
    }
    if horizon_years > input.financing.loan_term_years {
        warnings.push("Holding period exceeds the loan term; loan fully repaid".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cumulative Holding-Period Return (cash flow + principal + appreciation + built-in equity)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_years(years: &[u32]) -> ReiCalcResult<()> {
    if years.is_empty() {
        return Err(ReiCalcError::InsufficientData(
            "At least one projection year is required".into(),
        ));
    }
    if years.contains(&0) {
        return Err(ReiCalcError::InvalidInput {
            field: "years".into(),
            reason: "Projection years are 1-indexed".into(),
        });
    }
    Ok(())
}

/// (1 + rate)^periods, or an input error on `field` past the decimal range.
fn growth_factor(rate: Rate, periods: u32, field: &str) -> ReiCalcResult<Decimal> {
    in_range((Decimal::ONE + rate).checked_powu(u64::from(periods)), field)
}

fn project_year(
    input: &InvestmentAssumptions,
    year: u32,
    debt_service: Money,
    field: &str,
) -> ReiCalcResult<ProFormaYear> {
    let market = &input.market;
    let elapsed_years = year - 1;

    let rent_factor = growth_factor(market.annual_rent_growth_rate, elapsed_years, field)?;
    let expense_factor = growth_factor(market.annual_expense_inflation_rate, elapsed_years, field)?;

    let gross_potential_rent =
        in_range(input.operating.annual_rent().checked_mul(rent_factor), field)?;
    let vacancy_loss = gross_potential_rent * market.vacancy_rate;
    let effective_gross_income = gross_potential_rent - vacancy_loss;
    let operating_expenses = in_range(
        input
            .operating
            .annual_operating_expenses()
            .checked_mul(expense_factor),
        field,
    )?;
    let net_operating_income = effective_gross_income - operating_expenses;
    let cash_flow = in_range(net_operating_income.checked_sub(debt_service), field)?;

    Ok(ProFormaYear {
        year,
        gross_potential_rent,
        vacancy_loss,
        effective_gross_income,
        operating_expenses,
        net_operating_income,
        debt_service,
        cash_flow,
    })
}

/// ((1 + total/cash)^(1/years) - 1) × 100, zero when undefined.
fn annualized_percent(total_return: Money, cash_investment: Money, years: u32) -> Percent {
    if cash_investment <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let Some(multiple) = total_return
        .checked_div(cash_investment)
        .and_then(|ratio| ratio.checked_add(Decimal::ONE))
    else {
        return Decimal::ZERO;
    };
    if multiple <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let exponent = Decimal::ONE / Decimal::from(years);
    match multiple.checked_powd(exponent) {
        Some(root) => (root - Decimal::ONE) * Decimal::ONE_HUNDRED,
        None => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{
        FinancingAssumptions, MarketAssumptions, OperatingAssumptions, PropertyValuation,
    };
    use crate::config::TaxPolicy;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    fn sample_input() -> InvestmentAssumptions {
        InvestmentAssumptions {
            financing: FinancingAssumptions {
                purchase_price: dec!(300000),
                down_payment_percent: dec!(20),
                interest_rate_annual_percent: dec!(6.5),
                loan_term_years: 30,
            },
            operating: OperatingAssumptions {
                monthly_rent: dec!(2500),
                monthly_expense_tax: dec!(300),
                monthly_expense_insurance: dec!(100),
                monthly_expense_maintenance: dec!(150),
                monthly_expense_management: dec!(200),
                ..Default::default()
            },
            market: MarketAssumptions {
                closing_costs_percent: dec!(3),
                annual_appreciation_rate: dec!(0.03),
                annual_rent_growth_rate: dec!(0.03),
                annual_expense_inflation_rate: dec!(0.02),
                vacancy_rate: dec!(0.05),
                tax_policy: TaxPolicy::default(),
            },
            valuation: Some(PropertyValuation {
                estimated_market_value: None,
                stabilized_market_value: Some(dec!(330000)),
                estimated_rehab_cost: Some(dec!(10000)),
            }),
        }
    }

    #[test]
    fn test_year_one_row() {
        let rows = compute_projection(&sample_input(), &[1]).unwrap();
        let y1 = &rows[0];
        assert_eq!(y1.year, 1);
        assert_eq!(y1.gross_potential_rent, dec!(30000));
        assert_eq!(y1.vacancy_loss, dec!(1500));
        assert_eq!(y1.effective_gross_income, dec!(28500));
        assert_eq!(y1.operating_expenses, dec!(9000));
        assert_eq!(y1.net_operating_income, dec!(19500));
        assert_close(y1.cash_flow, dec!(1296.44), dec!(0.01));
    }

    #[test]
    fn test_non_contiguous_years_in_request_order() {
        let rows = compute_projection(&sample_input(), &DISPLAY_PROJECTION_YEARS).unwrap();
        let years: Vec<u32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![1, 2, 3, 5]);

        let y5 = &rows[3];
        // 30000 * 1.03^4
        assert_eq!(y5.gross_potential_rent, dec!(33765.2643));
        // 9000 * 1.02^4
        assert_eq!(y5.operating_expenses, dec!(9741.88944));
        assert_close(y5.net_operating_income, dec!(22335.1116), dec!(0.0001));

        let reversed = compute_projection(&sample_input(), &[5, 1]).unwrap();
        assert_eq!(reversed[0], rows[3]);
    }

    #[test]
    fn test_debt_service_constant() {
        let rows = compute_projection(&sample_input(), &[1, 2, 3, 4, 5]).unwrap();
        assert!(rows.iter().all(|r| r.debt_service == rows[0].debt_service));
    }

    #[test]
    fn test_noi_identities() {
        let input = sample_input();
        for row in compute_projection(&input, &[1, 2, 3, 4, 5, 10]).unwrap() {
            assert_eq!(
                row.net_operating_income,
                row.effective_gross_income - row.operating_expenses
            );
            assert_close(
                row.effective_gross_income,
                row.gross_potential_rent * (Decimal::ONE - input.market.vacancy_rate),
                dec!(0.0000001),
            );
            assert_eq!(row.cash_flow, row.net_operating_income - row.debt_service);
        }
    }

    #[test]
    fn test_invalid_year_requests() {
        let input = sample_input();
        assert!(matches!(
            compute_projection(&input, &[]).unwrap_err(),
            ReiCalcError::InsufficientData(_)
        ));
        assert_eq!(
            compute_projection(&input, &[0, 1]).unwrap_err().field(),
            Some("years")
        );
    }

    #[test]
    fn test_five_year_cumulative() {
        let out = compute_five_year_returns(&sample_input()).unwrap();
        assert_eq!(out.horizon_years, 5);
        assert_eq!(out.cash_investment, dec!(69000));
        assert_close(out.cumulative_cash_flow, dec!(13456.2138), dec!(0.0001));
        assert_close(out.cumulative_principal_paid, dec!(15333.6541), dec!(0.0001));
        assert_eq!(out.future_value, dec!(347782.2222900000));
        assert_eq!(out.total_appreciation, dec!(47782.22229));
        assert_eq!(out.built_in_equity, dec!(20000));
        assert_close(out.total_cumulative_return, dec!(96572.0902), dec!(0.0001));
        assert_close(out.return_on_cash_invested_percent, dec!(139.9596), dec!(0.0001));
    }

    #[test]
    fn test_five_year_tax_variant() {
        let out = compute_five_year_returns(&sample_input()).unwrap();
        assert_close(out.cumulative_tax_savings, dec!(10909.0909), dec!(0.0001));
        assert_eq!(
            out.total_cumulative_return_with_tax,
            out.total_cumulative_return + out.cumulative_tax_savings
        );
        assert_close(
            out.return_on_cash_invested_with_tax_percent,
            dec!(155.7698),
            dec!(0.0001),
        );
    }

    #[test]
    fn test_annualized_return() {
        let out = compute_five_year_returns(&sample_input()).unwrap();
        // (1 + 1.399596)^(1/5) - 1 ≈ 19.13%
        assert_close(out.annualized_return_percent, dec!(19.13), dec!(0.01));
    }

    #[test]
    fn test_cumulative_zero_cash_investment() {
        let mut input = sample_input();
        input.financing.down_payment_percent = Decimal::ZERO;
        input.market.closing_costs_percent = Decimal::ZERO;
        let out = compute_five_year_returns(&input).unwrap();
        assert_eq!(out.return_on_cash_invested_percent, Decimal::ZERO);
        assert_eq!(out.return_on_cash_invested_with_tax_percent, Decimal::ZERO);
        assert_eq!(out.annualized_return_percent, Decimal::ZERO);
    }

    #[test]
    fn test_horizon_longer_than_loan() {
        let mut input = sample_input();
        input.financing.loan_term_years = 3;
        let out = project_cumulative_returns(&input, 5).unwrap();
        assert_close(
            out.result.cumulative_principal_paid,
            dec!(240000),
            dec!(0.01),
        );
        assert!(out.warnings.iter().any(|w| w.contains("exceeds the loan term")));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        assert_eq!(
            compute_cumulative_returns(&sample_input(), 0)
                .unwrap_err()
                .field(),
            Some("horizon_years")
        );
    }

    #[test]
    fn test_far_projection_year_out_of_range() {
        // 1.03^2999 is past the decimal range
        let err = compute_projection(&sample_input(), &[1, 3000]).unwrap_err();
        assert!(matches!(err, ReiCalcError::InvalidInput { .. }));
        assert_eq!(err.field(), Some("years"));
    }

    #[test]
    fn test_long_horizon_out_of_range() {
        let err = compute_cumulative_returns(&sample_input(), 3000).unwrap_err();
        assert_eq!(err.field(), Some("horizon_years"));
    }

    #[test]
    fn test_long_representable_horizon() {
        let out = compute_cumulative_returns(&sample_input(), 100).unwrap();
        assert_close(out.cumulative_principal_paid, dec!(240000), dec!(0.01));
        assert!(out.total_cumulative_return > out.total_appreciation);
    }

    #[test]
    fn test_expense_inflation_warning() {
        let mut input = sample_input();
        input.market.annual_expense_inflation_rate = dec!(0.05);
        let out = project_pro_forma(&input, &DISPLAY_PROJECTION_YEARS).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("NOI erodes")));
    }
}
