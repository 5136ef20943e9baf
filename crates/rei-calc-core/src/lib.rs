pub mod amortization;
pub mod assumptions;
pub mod config;
pub mod error;
pub mod pro_forma;
pub mod types;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "listings")]
pub mod listing;

pub use assumptions::*;
pub use config::{CityDefaults, CityDefaultsTable, EngineConfig, TaxPolicy};
pub use error::ReiCalcError;
pub use types::*;

/// Standard result type for all rei-calc operations
pub type ReiCalcResult<T> = Result<T, ReiCalcError>;
