use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use rei_calc_core::amortization;
use rei_calc_core::FinancingAssumptions;

use crate::input;

/// Arguments for the mortgage calculation
#[derive(Args)]
pub struct MortgageArgs {
    /// Purchase price (the loan is price less down payment)
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment in percent of price (e.g. 20 for 20%)
    #[arg(long, default_value = "20")]
    pub down_payment: Decimal,

    /// Loan amount; when given, the price is taken as equal to it with no down payment
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5 for 6.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub term_years: u32,

    /// Include the year-by-year amortization schedule
    #[arg(long)]
    pub schedule: bool,

    /// Path to JSON file with financing assumptions (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let financing: FinancingAssumptions = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let rate = args
            .rate
            .ok_or("--rate is required (or provide --input)")?;
        match (args.loan_amount, args.price) {
            (Some(loan), _) => FinancingAssumptions {
                purchase_price: loan,
                down_payment_percent: dec!(0),
                interest_rate_annual_percent: rate,
                loan_term_years: args.term_years,
            },
            (None, Some(price)) => FinancingAssumptions {
                purchase_price: price,
                down_payment_percent: args.down_payment,
                interest_rate_annual_percent: rate,
                loan_term_years: args.term_years,
            },
            (None, None) => {
                return Err("--loan-amount or --price is required (or provide --input)".into())
            }
        }
    };

    let mut result = serde_json::to_value(amortization::amortize(&financing)?)?;
    if !args.schedule {
        if let Some(Value::Object(summary)) = result.get_mut("result") {
            summary.remove("annual_schedule");
        }
    }
    Ok(result)
}
