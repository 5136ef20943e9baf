use clap::Args;
use serde_json::Value;

use rei_calc_core::metrics;
use rei_calc_core::pro_forma;
use rei_calc_core::projection::{self, DISPLAY_PROJECTION_YEARS, FIVE_YEAR_HORIZON};
use rei_calc_core::InvestmentAssumptions;

use crate::input;

/// Arguments for commands that take a full set of investment assumptions
#[derive(Args)]
pub struct AssumptionsArgs {
    /// Path to JSON file with investment assumptions
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the multi-year projection
#[derive(Args)]
pub struct ProjectionArgs {
    /// Path to JSON file with investment assumptions
    #[arg(long)]
    pub input: Option<String>,

    /// Years to project (comma-separated, e.g. "1,2,3,5")
    #[arg(long, value_delimiter = ',')]
    pub years: Option<Vec<u32>>,
}

/// Arguments for cumulative holding-period returns
#[derive(Args)]
pub struct CumulativeArgs {
    /// Path to JSON file with investment assumptions
    #[arg(long)]
    pub input: Option<String>,

    /// Holding period in years
    #[arg(long, default_value_t = FIVE_YEAR_HORIZON)]
    pub horizon: u32,
}

pub fn run_year_one(
    args: AssumptionsArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = read_assumptions(args.input.as_deref(), config, "year-one returns")?;
    let result = pro_forma::compute_year_one(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_projection(
    args: ProjectionArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = read_assumptions(args.input.as_deref(), config, "projection")?;
    let years = args
        .years
        .unwrap_or_else(|| DISPLAY_PROJECTION_YEARS.to_vec());
    let result = projection::project_pro_forma(&assumptions, &years)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cumulative(
    args: CumulativeArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = read_assumptions(args.input.as_deref(), config, "cumulative returns")?;
    let result = projection::project_cumulative_returns(&assumptions, args.horizon)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_metrics(
    args: AssumptionsArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = read_assumptions(args.input.as_deref(), config, "return metrics")?;
    let result = metrics::compute_display_metrics(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(
    args: AssumptionsArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = read_assumptions(args.input.as_deref(), config, "investment analysis")?;
    let result = metrics::analyze_investment(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

/// Parse assumptions from `--input` or stdin. A `market.tax_policy` given in
/// the input wins; otherwise the configured deployment policy applies.
fn read_assumptions(
    path: Option<&str>,
    config: Option<&str>,
    command: &str,
) -> Result<InvestmentAssumptions, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input_value(path, command)?;
    let has_policy = data
        .get("market")
        .and_then(|m| m.get("tax_policy"))
        .is_some();

    let mut assumptions: InvestmentAssumptions = serde_json::from_value(data)?;
    if !has_policy && config.is_some() {
        assumptions.market.tax_policy = input::config::load_config(config)?.tax_policy;
    }
    Ok(assumptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::input::file::write_temp_file;

    const POLICY_CONFIG: &str = r#"
tax_policy:
  depreciation_period_years: "39"
  structure_value_fraction: "0.75"
  marginal_tax_rate: "0.35"
"#;

    fn assumptions_json(tax_policy: Option<&str>) -> String {
        let policy = tax_policy
            .map(|p| format!(r#", "tax_policy": {p}"#))
            .unwrap_or_default();
        format!(
            r#"{{
                "financing": {{
                    "purchase_price": "300000",
                    "down_payment_percent": "20",
                    "interest_rate_annual_percent": "6.5",
                    "loan_term_years": 30
                }},
                "operating": {{ "monthly_rent": "2500", "monthly_expense_tax": "750" }},
                "market": {{
                    "closing_costs_percent": "3",
                    "annual_appreciation_rate": "0.03",
                    "annual_rent_growth_rate": "0.03"{policy}
                }}
            }}"#
        )
    }

    #[test]
    fn test_config_policy_applies_without_inline_policy() {
        let input = write_temp_file("no-policy.json", &assumptions_json(None));
        let config = write_temp_file("policy-a.yaml", POLICY_CONFIG);

        let a = read_assumptions(input.to_str(), config.to_str(), "year-one returns").unwrap();
        assert_eq!(a.market.tax_policy.marginal_tax_rate, dec!(0.35));
        assert_eq!(a.market.tax_policy.depreciation_period_years, dec!(39));
    }

    #[test]
    fn test_inline_policy_wins_over_config() {
        let input = write_temp_file(
            "inline-policy.json",
            &assumptions_json(Some(r#"{ "marginal_tax_rate": "0.10" }"#)),
        );
        let config = write_temp_file("policy-b.yaml", POLICY_CONFIG);

        let a = read_assumptions(input.to_str(), config.to_str(), "year-one returns").unwrap();
        assert_eq!(a.market.tax_policy.marginal_tax_rate, dec!(0.10));
        // Unset inline fields fall back to the built-in policy, not the config
        assert_eq!(a.market.tax_policy.depreciation_period_years, dec!(27.5));
    }

    #[test]
    fn test_built_in_policy_without_config() {
        let input = write_temp_file("no-config.json", &assumptions_json(None));
        let a = read_assumptions(input.to_str(), None, "year-one returns").unwrap();
        assert_eq!(a.market.tax_policy.marginal_tax_rate, dec!(0.25));
    }

    #[test]
    fn test_year_one_uses_config_policy() {
        let input = write_temp_file("year-one.json", &assumptions_json(None));
        let config = write_temp_file("policy-c.yaml", POLICY_CONFIG);
        let args = AssumptionsArgs {
            input: input.to_str().map(String::from),
        };
        let value = run_year_one(args, config.to_str()).unwrap();
        // 300000 * 0.75 / 39 * 0.35
        let savings: rust_decimal::Decimal = value["result"]["tax_savings"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((savings - dec!(2019.230769)).abs() < dec!(0.000001));
    }
}
