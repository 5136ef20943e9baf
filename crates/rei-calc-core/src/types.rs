use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ReiCalcError;
use crate::ReiCalcResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentage points (6.5 = 6.5%). Used for user-facing percent inputs and
/// every `*_percent` output.
pub type Percent = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Largest money or percent input accepted. Keeps every product of two
/// inputs inside the 96-bit decimal range.
pub const MAX_INPUT_MAGNITUDE: Decimal = dec!(1000000000000);

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Map an overflowed `checked_*` result to an invalid-input error on the
/// input that drove it there.
pub fn in_range(value: Option<Decimal>, field: &str) -> ReiCalcResult<Decimal> {
    value.ok_or_else(|| ReiCalcError::InvalidInput {
        field: field.into(),
        reason: "Result exceeds the representable decimal range".into(),
    })
}

/// `numerator / denominator × 100`, or zero when the denominator is not
/// positive. Ratios over a zero-cost or zero-investment basis are defined
/// as 0%. `field` names the input behind the denominator.
pub fn guarded_percent(
    numerator: Decimal,
    denominator: Decimal,
    field: &str,
) -> ReiCalcResult<Percent> {
    if denominator <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    in_range(
        numerator
            .checked_div(denominator)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED)),
        field,
    )
}
