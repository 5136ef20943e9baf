use rei_calc_core::EngineConfig;

use super::file;

/// Load the engine configuration, or the built-in defaults when no file is
/// given.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let config: EngineConfig = file::read_structured(path)?;
            log::debug!(
                "loaded config from {path}: {} city entries",
                config.cities.len()
            );
            config
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::input::file::write_temp_file;

    const SAMPLE_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/engine.yaml");

    #[test]
    fn test_sample_yaml_config_resolves_postal_code() {
        let config = load_config(Some(SAMPLE_CONFIG)).unwrap();
        assert_eq!(config.cities.len(), 3);
        assert_eq!(config.tax_policy.depreciation_period_years, dec!(27.5));

        let table = config.city_table();
        let zip = table.lookup(Some("austin"), Some("78704"));
        assert_eq!(zip.down_payment_percent, dec!(25));
        assert_eq!(zip.vacancy_rate, dec!(0.04));

        let city = table.lookup(Some("Austin"), Some("78745"));
        assert_eq!(city.down_payment_percent, dec!(20));
        assert_eq!(city.vacancy_rate, dec!(0.05));

        let fallback = table.lookup(Some("Boise"), None);
        assert_eq!(fallback.city, "National Average");
    }

    #[test]
    fn test_json_config() {
        let path = write_temp_file(
            "config.json",
            r#"{
                "tax_policy": { "marginal_tax_rate": "0.32" },
                "cities": [{
                    "city": "Tampa",
                    "interest_rate_percent": "6.8",
                    "down_payment_percent": "15",
                    "loan_term_years": 30,
                    "closing_costs_percent": "2",
                    "annual_appreciation_rate": "0.05",
                    "annual_rent_growth_rate": "0.04"
                }]
            }"#,
        );
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.tax_policy.marginal_tax_rate, dec!(0.32));
        assert_eq!(config.tax_policy.depreciation_period_years, dec!(27.5));
        assert_eq!(config.national_defaults.interest_rate_percent, dec!(7.0));
        let tampa = config.city_table().lookup(Some("Tampa"), None);
        assert_eq!(tampa.down_payment_percent, dec!(15));
    }

    #[test]
    fn test_zero_term_city_rejected() {
        let path = write_temp_file(
            "zero-term.yaml",
            r#"
cities:
  - city: Nowhere
    interest_rate_percent: "7"
    down_payment_percent: "20"
    loan_term_years: 0
    closing_costs_percent: "3"
    annual_appreciation_rate: "0.03"
    annual_rent_growth_rate: "0.03"
"#,
        );
        let err = load_config(path.to_str()).unwrap_err();
        assert!(err.to_string().contains("loan_term_years"), "{err}");
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.cities.is_empty());
        assert_eq!(config.tax_policy.marginal_tax_rate, dec!(0.25));
    }
}
