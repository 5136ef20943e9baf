use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ReiCalcError;
use crate::types::{Percent, Rate};
use crate::ReiCalcResult;

// ---------------------------------------------------------------------------
// Tax policy
// ---------------------------------------------------------------------------

/// Depreciation and tax policy applied to every calculation.
///
/// These are deployment-level defaults, not calculator inputs. They are
/// carried inside `MarketAssumptions` so that one calculation always sees a
/// single, fixed policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxPolicy {
    /// Residential straight-line recovery period in years
    pub depreciation_period_years: Decimal,
    /// Share of the purchase price attributable to the structure (land is
    /// not depreciable)
    pub structure_value_fraction: Rate,
    /// Marginal income tax rate applied to the depreciation deduction
    pub marginal_tax_rate: Rate,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        TaxPolicy {
            depreciation_period_years: dec!(27.5),
            structure_value_fraction: dec!(0.80),
            marginal_tax_rate: dec!(0.25),
        }
    }
}

impl TaxPolicy {
    pub fn validate(&self) -> ReiCalcResult<()> {
        if self.depreciation_period_years < Decimal::ONE {
            return Err(ReiCalcError::InvalidInput {
                field: "depreciation_period_years".into(),
                reason: "Depreciation period must be at least 1 year".into(),
            });
        }
        if self.structure_value_fraction < Decimal::ZERO
            || self.structure_value_fraction > Decimal::ONE
        {
            return Err(ReiCalcError::InvalidInput {
                field: "structure_value_fraction".into(),
                reason: "Structure value fraction must be between 0 and 1".into(),
            });
        }
        if self.marginal_tax_rate < Decimal::ZERO || self.marginal_tax_rate > Decimal::ONE {
            return Err(ReiCalcError::InvalidInput {
                field: "marginal_tax_rate".into(),
                reason: "Marginal tax rate must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// City defaults
// ---------------------------------------------------------------------------

/// Locality-level assumption defaults, used when a listing does not carry
/// its own rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDefaults {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal codes this entry is specific to (empty = whole city)
    #[serde(default)]
    pub postal_codes: Vec<String>,
    pub interest_rate_percent: Percent,
    pub down_payment_percent: Percent,
    pub loan_term_years: u32,
    pub closing_costs_percent: Percent,
    pub annual_appreciation_rate: Rate,
    pub annual_rent_growth_rate: Rate,
    #[serde(default = "default_expense_inflation")]
    pub annual_expense_inflation_rate: Rate,
    #[serde(default = "default_vacancy")]
    pub vacancy_rate: Rate,
}

pub(crate) fn default_expense_inflation() -> Rate {
    dec!(0.02)
}

pub(crate) fn default_vacancy() -> Rate {
    dec!(0.05)
}

impl CityDefaults {
    /// National-average record used when no city entry matches.
    pub fn national_average() -> Self {
        CityDefaults {
            city: "National Average".into(),
            state: None,
            postal_codes: Vec::new(),
            interest_rate_percent: dec!(7.0),
            down_payment_percent: dec!(20),
            loan_term_years: 30,
            closing_costs_percent: dec!(3),
            annual_appreciation_rate: dec!(0.035),
            annual_rent_growth_rate: dec!(0.03),
            annual_expense_inflation_rate: default_expense_inflation(),
            vacancy_rate: default_vacancy(),
        }
    }

    fn matches_city(&self, city: &str) -> bool {
        self.city.trim().eq_ignore_ascii_case(city.trim())
    }

    fn covers_postal_code(&self, postal_code: &str) -> bool {
        let code = postal_code.trim();
        self.postal_codes.iter().any(|c| c.trim() == code)
    }
}

impl Default for CityDefaults {
    fn default() -> Self {
        CityDefaults::national_average()
    }
}

/// Lookup over a set of city entries with a national fallback.
#[derive(Debug, Clone, Copy)]
pub struct CityDefaultsTable<'a> {
    cities: &'a [CityDefaults],
    fallback: &'a CityDefaults,
}

impl<'a> CityDefaultsTable<'a> {
    pub fn new(cities: &'a [CityDefaults], fallback: &'a CityDefaults) -> Self {
        CityDefaultsTable { cities, fallback }
    }

    /// Resolve defaults for a city, optionally refined by postal code.
    ///
    /// Among entries for the same city, one listing the postal code wins;
    /// otherwise the first entry for the city is used. With no city match
    /// the national fallback is returned.
    pub fn lookup(&self, city: Option<&str>, postal_code: Option<&str>) -> &'a CityDefaults {
        let Some(city) = city.filter(|c| !c.trim().is_empty()) else {
            return self.fallback;
        };

        let mut first_match: Option<&'a CityDefaults> = None;
        for entry in self.cities.iter().filter(|e| e.matches_city(city)) {
            if let Some(code) = postal_code {
                if entry.covers_postal_code(code) {
                    return entry;
                }
            }
            if first_match.is_none() {
                first_match = Some(entry);
            }
        }

        match first_match {
            Some(entry) => entry,
            None => {
                log::debug!("no city defaults for '{city}', using national averages");
                self.fallback
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Deployment-level configuration: tax policy plus locality defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tax_policy: TaxPolicy,
    pub national_defaults: CityDefaults,
    pub cities: Vec<CityDefaults>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tax_policy: TaxPolicy::default(),
            national_defaults: CityDefaults::national_average(),
            cities: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn city_table(&self) -> CityDefaultsTable<'_> {
        CityDefaultsTable::new(&self.cities, &self.national_defaults)
    }

    pub fn validate(&self) -> ReiCalcResult<()> {
        self.tax_policy.validate()?;
        for entry in std::iter::once(&self.national_defaults).chain(self.cities.iter()) {
            if entry.loan_term_years == 0 {
                return Err(ReiCalcError::InvalidInput {
                    field: format!("cities[{}].loan_term_years", entry.city),
                    reason: "Loan term must be at least 1 year".into(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
