use clap::Args;
use serde_json::Value;

use rei_calc_core::listing::{self, ListingAnalysisRequest};

use crate::input;

/// Arguments for listing analysis
#[derive(Args)]
pub struct ListingArgs {
    /// Path to JSON file: { "listing": {...}, "overrides": {...} }
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_listing(
    args: ListingArgs,
    config: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let data = input::stdin::read_input_value(args.input.as_deref(), "listing analysis")?;
    let request: ListingAnalysisRequest = serde_json::from_value(data)?;
    let engine_config = input::config::load_config(config)?;

    let result = listing::analyze_listing(&request.listing, &engine_config, &request.overrides)?;
    Ok(serde_json::to_value(result)?)
}
