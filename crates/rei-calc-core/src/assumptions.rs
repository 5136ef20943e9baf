use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{default_expense_inflation, default_vacancy, TaxPolicy};
use crate::error::ReiCalcError;
use crate::types::{Money, Percent, Rate, MAX_INPUT_MAGNITUDE};
use crate::ReiCalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Acquisition price and fixed-rate loan terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingAssumptions {
    pub purchase_price: Money,
    /// Down payment as percentage points of the price (20 = 20%)
    pub down_payment_percent: Percent,
    /// Annual note rate in percentage points (6.5 = 6.5%)
    pub interest_rate_annual_percent: Percent,
    pub loan_term_years: u32,
}

/// Monthly rent and the monthly operating expense lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingAssumptions {
    pub monthly_rent: Money,
    pub monthly_expense_tax: Money,
    pub monthly_expense_insurance: Money,
    pub monthly_expense_maintenance: Money,
    pub monthly_expense_management: Money,
    pub monthly_expense_hoa: Money,
    pub monthly_expense_utilities: Money,
    pub monthly_expense_other: Money,
    pub monthly_capex_reserve: Money,
}

/// Closing costs, growth rates and the tax policy in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAssumptions {
    /// Closing costs as percentage points of the price
    pub closing_costs_percent: Percent,
    pub annual_appreciation_rate: Rate,
    pub annual_rent_growth_rate: Rate,
    #[serde(default = "default_expense_inflation")]
    pub annual_expense_inflation_rate: Rate,
    #[serde(default = "default_vacancy")]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub tax_policy: TaxPolicy,
}

/// Optional valuation enrichment used for built-in equity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyValuation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_market_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stabilized_market_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_rehab_cost: Option<Money>,
}

/// The complete input tuple for every return calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAssumptions {
    pub financing: FinancingAssumptions,
    #[serde(default)]
    pub operating: OperatingAssumptions,
    pub market: MarketAssumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<PropertyValuation>,
}

// ---------------------------------------------------------------------------
// Derived quantities
// ---------------------------------------------------------------------------

impl FinancingAssumptions {
    pub fn down_payment_amount(&self) -> Money {
        self.purchase_price * self.down_payment_percent / Decimal::ONE_HUNDRED
    }

    pub fn loan_amount(&self) -> Money {
        self.purchase_price - self.down_payment_amount()
    }

    pub fn validate(&self) -> ReiCalcResult<()> {
        input_in_range("purchase_price", self.purchase_price)?;
        if self.down_payment_percent < Decimal::ZERO
            || self.down_payment_percent > Decimal::ONE_HUNDRED
        {
            return Err(ReiCalcError::InvalidInput {
                field: "down_payment_percent".into(),
                reason: "Down payment must be between 0 and 100 percent".into(),
            });
        }
        input_in_range(
            "interest_rate_annual_percent",
            self.interest_rate_annual_percent,
        )?;
        if self.loan_term_years == 0 {
            return Err(ReiCalcError::InvalidInput {
                field: "loan_term_years".into(),
                reason: "Loan term must be at least 1 year".into(),
            });
        }
        Ok(())
    }
}

impl OperatingAssumptions {
    /// Sum of every monthly expense line, capex reserve included.
    pub fn monthly_operating_expenses(&self) -> Money {
        self.monthly_expense_tax
            + self.monthly_expense_insurance
            + self.monthly_expense_maintenance
            + self.monthly_expense_management
            + self.monthly_expense_hoa
            + self.monthly_expense_utilities
            + self.monthly_expense_other
            + self.monthly_capex_reserve
    }

    pub fn annual_operating_expenses(&self) -> Money {
        self.monthly_operating_expenses() * MONTHS_PER_YEAR
    }

    pub fn annual_rent(&self) -> Money {
        self.monthly_rent * MONTHS_PER_YEAR
    }

    pub fn validate(&self) -> ReiCalcResult<()> {
        input_in_range("monthly_rent", self.monthly_rent)?;
        input_in_range("monthly_expense_tax", self.monthly_expense_tax)?;
        input_in_range("monthly_expense_insurance", self.monthly_expense_insurance)?;
        input_in_range("monthly_expense_maintenance", self.monthly_expense_maintenance)?;
        input_in_range("monthly_expense_management", self.monthly_expense_management)?;
        input_in_range("monthly_expense_hoa", self.monthly_expense_hoa)?;
        input_in_range("monthly_expense_utilities", self.monthly_expense_utilities)?;
        input_in_range("monthly_expense_other", self.monthly_expense_other)?;
        input_in_range("monthly_capex_reserve", self.monthly_capex_reserve)?;
        Ok(())
    }
}

impl MarketAssumptions {
    pub fn validate(&self) -> ReiCalcResult<()> {
        input_in_range("closing_costs_percent", self.closing_costs_percent)?;
        above_minus_one("annual_appreciation_rate", self.annual_appreciation_rate)?;
        above_minus_one("annual_rent_growth_rate", self.annual_rent_growth_rate)?;
        above_minus_one(
            "annual_expense_inflation_rate",
            self.annual_expense_inflation_rate,
        )?;
        if self.vacancy_rate < Decimal::ZERO || self.vacancy_rate >= Decimal::ONE {
            return Err(ReiCalcError::InvalidInput {
                field: "vacancy_rate".into(),
                reason: "Vacancy rate must be between 0 and 1 (exclusive upper)".into(),
            });
        }
        self.tax_policy.validate()
    }

    /// Straight-line depreciation on the structure share of the price.
    pub fn annual_depreciation(&self, purchase_price: Money) -> Money {
        purchase_price * self.tax_policy.structure_value_fraction
            / self.tax_policy.depreciation_period_years
    }

    /// Tax saved by deducting one year of depreciation.
    pub fn annual_tax_savings(&self, purchase_price: Money) -> Money {
        self.annual_depreciation(purchase_price) * self.tax_policy.marginal_tax_rate
    }
}

impl PropertyValuation {
    pub fn validate(&self) -> ReiCalcResult<()> {
        if let Some(v) = self.estimated_market_value {
            input_in_range("estimated_market_value", v)?;
        }
        if let Some(v) = self.stabilized_market_value {
            input_in_range("stabilized_market_value", v)?;
        }
        if let Some(v) = self.estimated_rehab_cost {
            input_in_range("estimated_rehab_cost", v)?;
        }
        Ok(())
    }

    /// Stabilized value minus price minus rehab. Zero without a stabilized
    /// value.
    pub fn built_in_equity(&self, purchase_price: Money) -> Money {
        match self.stabilized_market_value {
            Some(stabilized) => {
                stabilized - purchase_price - self.estimated_rehab_cost.unwrap_or(Decimal::ZERO)
            }
            None => Decimal::ZERO,
        }
    }
}

impl InvestmentAssumptions {
    pub fn validate(&self) -> ReiCalcResult<()> {
        self.financing.validate()?;
        self.operating.validate()?;
        self.market.validate()?;
        if let Some(valuation) = &self.valuation {
            valuation.validate()?;
        }
        Ok(())
    }

    pub fn built_in_equity(&self) -> Money {
        self.valuation
            .as_ref()
            .map(|v| v.built_in_equity(self.financing.purchase_price))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn closing_costs(&self) -> Money {
        self.financing.purchase_price * self.market.closing_costs_percent / Decimal::ONE_HUNDRED
    }

    /// Down payment plus closing costs.
    pub fn cash_investment(&self) -> Money {
        self.financing.down_payment_amount() + self.closing_costs()
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Non-negative and no larger than `MAX_INPUT_MAGNITUDE`.
fn input_in_range(field: &str, value: Decimal) -> ReiCalcResult<()> {
    if value < Decimal::ZERO {
        return Err(ReiCalcError::InvalidInput {
            field: field.into(),
            reason: "Must not be negative".into(),
        });
    }
    if value > MAX_INPUT_MAGNITUDE {
        return Err(ReiCalcError::InvalidInput {
            field: field.into(),
            reason: format!("Must not exceed {MAX_INPUT_MAGNITUDE}"),
        });
    }
    Ok(())
}

fn above_minus_one(field: &str, value: Rate) -> ReiCalcResult<()> {
    if value <= dec!(-1) {
        return Err(ReiCalcError::InvalidInput {
            field: field.into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }
    if value > MAX_INPUT_MAGNITUDE {
        return Err(ReiCalcError::InvalidInput {
            field: field.into(),
            reason: format!("Must not exceed {MAX_INPUT_MAGNITUDE}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn financing() -> FinancingAssumptions {
        FinancingAssumptions {
            purchase_price: dec!(300000),
            down_payment_percent: dec!(20),
            interest_rate_annual_percent: dec!(6.5),
            loan_term_years: 30,
        }
    }

    #[test]
    fn test_loan_amount() {
        let f = financing();
        assert_eq!(f.down_payment_amount(), dec!(60000));
        assert_eq!(f.loan_amount(), dec!(240000));
    }

    #[test]
    fn test_all_cash_purchase_has_no_loan() {
        let f = FinancingAssumptions {
            down_payment_percent: dec!(100),
            ..financing()
        };
        assert!(f.validate().is_ok());
        assert_eq!(f.loan_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_down_payment_out_of_range() {
        let f = FinancingAssumptions {
            down_payment_percent: dec!(101),
            ..financing()
        };
        let err = f.validate().unwrap_err();
        assert_eq!(err.field(), Some("down_payment_percent"));
    }

    #[test]
    fn test_oversized_inputs_rejected() {
        let f = FinancingAssumptions {
            purchase_price: dec!(1000000000001),
            ..financing()
        };
        assert_eq!(f.validate().unwrap_err().field(), Some("purchase_price"));

        let f = FinancingAssumptions {
            purchase_price: MAX_INPUT_MAGNITUDE,
            ..financing()
        };
        assert!(f.validate().is_ok());

        let op = OperatingAssumptions {
            monthly_rent: Decimal::MAX,
            ..Default::default()
        };
        assert_eq!(op.validate().unwrap_err().field(), Some("monthly_rent"));
    }

    #[test]
    fn test_zero_term_rejected() {
        let f = FinancingAssumptions {
            loan_term_years: 0,
            ..financing()
        };
        assert_eq!(f.validate().unwrap_err().field(), Some("loan_term_years"));
    }

    #[test]
    fn test_negative_expense_rejected() {
        let op = OperatingAssumptions {
            monthly_rent: dec!(2000),
            monthly_expense_hoa: dec!(-5),
            ..Default::default()
        };
        assert_eq!(op.validate().unwrap_err().field(), Some("monthly_expense_hoa"));
    }

    #[test]
    fn test_operating_expense_sum_includes_capex() {
        let op = OperatingAssumptions {
            monthly_rent: dec!(2500),
            monthly_expense_tax: dec!(300),
            monthly_expense_insurance: dec!(100),
            monthly_expense_maintenance: dec!(150),
            monthly_expense_management: dec!(200),
            monthly_capex_reserve: dec!(50),
            ..Default::default()
        };
        assert_eq!(op.monthly_operating_expenses(), dec!(800));
        assert_eq!(op.annual_operating_expenses(), dec!(9600));
        assert_eq!(op.annual_rent(), dec!(30000));
    }

    #[test]
    fn test_operating_defaults_missing_fields_to_zero() {
        let op: OperatingAssumptions =
            serde_json::from_str(r#"{ "monthly_rent": "1800" }"#).unwrap();
        assert_eq!(op.monthly_rent, dec!(1800));
        assert_eq!(op.monthly_operating_expenses(), Decimal::ZERO);
    }

    #[test]
    fn test_market_defaults() {
        let m: MarketAssumptions = serde_json::from_str(
            r#"{
                "closing_costs_percent": "3",
                "annual_appreciation_rate": "0.03",
                "annual_rent_growth_rate": "0.03"
            }"#,
        )
        .unwrap();
        assert_eq!(m.annual_expense_inflation_rate, dec!(0.02));
        assert_eq!(m.vacancy_rate, dec!(0.05));
        assert_eq!(m.tax_policy, TaxPolicy::default());
    }

    #[test]
    fn test_vacancy_must_be_below_one() {
        let m = MarketAssumptions {
            closing_costs_percent: dec!(3),
            annual_appreciation_rate: dec!(0.03),
            annual_rent_growth_rate: dec!(0.03),
            annual_expense_inflation_rate: dec!(0.02),
            vacancy_rate: Decimal::ONE,
            tax_policy: TaxPolicy::default(),
        };
        assert_eq!(m.validate().unwrap_err().field(), Some("vacancy_rate"));
    }

    #[test]
    fn test_tax_savings() {
        let m = MarketAssumptions {
            closing_costs_percent: dec!(3),
            annual_appreciation_rate: dec!(0.03),
            annual_rent_growth_rate: dec!(0.03),
            annual_expense_inflation_rate: dec!(0.02),
            vacancy_rate: dec!(0.05),
            tax_policy: TaxPolicy::default(),
        };
        // 275000 * 0.8 / 27.5 = 8000; * 0.25 = 2000
        assert_eq!(m.annual_depreciation(dec!(275000)), dec!(8000));
        assert_eq!(m.annual_tax_savings(dec!(275000)), dec!(2000));
    }

    #[test]
    fn test_built_in_equity() {
        let v = PropertyValuation {
            estimated_market_value: Some(dec!(310000)),
            stabilized_market_value: Some(dec!(330000)),
            estimated_rehab_cost: Some(dec!(10000)),
        };
        assert_eq!(v.built_in_equity(dec!(300000)), dec!(20000));

        let no_rehab = PropertyValuation {
            estimated_rehab_cost: None,
            ..v.clone()
        };
        assert_eq!(no_rehab.built_in_equity(dec!(300000)), dec!(30000));

        assert_eq!(
            PropertyValuation::default().built_in_equity(dec!(300000)),
            Decimal::ZERO
        );
    }
}
