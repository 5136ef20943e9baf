mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;

use commands::listing::ListingArgs;
use commands::mortgage::MortgageArgs;
use commands::returns::{AssumptionsArgs, CumulativeArgs, ProjectionArgs};
use output::OutputFormat;

/// Real-estate investment return calculations
#[derive(Parser)]
#[command(
    name = "reicalc",
    version,
    about = "Real-estate investment return calculations",
    long_about = "A CLI for rental property return calculations with decimal precision. \
                  Supports mortgage amortization, year-1 pro-forma returns, multi-year \
                  projections, cumulative holding-period returns and listing analysis \
                  with locality defaults."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (YAML or JSON): tax policy and city defaults
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly mortgage payment and amortization schedule
    Mortgage(MortgageArgs),
    /// Year-1 pro-forma returns (cash flow, paydown, built-in equity, tax shield)
    YearOne(AssumptionsArgs),
    /// Multi-year pro-forma projection
    Projection(ProjectionArgs),
    /// Cumulative holding-period returns
    Cumulative(CumulativeArgs),
    /// Cap rate, gross yield, cash-on-cash and ROI
    Metrics(AssumptionsArgs),
    /// Full investment analysis from explicit assumptions
    Analyze(AssumptionsArgs),
    /// Analyse a listing using city defaults from the configuration
    Listing(ListingArgs),
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Mortgage(args) => commands::mortgage::run_mortgage(args),
        Commands::YearOne(args) => commands::returns::run_year_one(args, cli.config.as_deref()),
        Commands::Projection(args) => commands::returns::run_projection(args, cli.config.as_deref()),
        Commands::Cumulative(args) => commands::returns::run_cumulative(args, cli.config.as_deref()),
        Commands::Metrics(args) => commands::returns::run_metrics(args, cli.config.as_deref()),
        Commands::Analyze(args) => commands::returns::run_analyze(args, cli.config.as_deref()),
        Commands::Listing(args) => commands::listing::run_listing(args, cli.config.as_deref()),
        Commands::Version => {
            println!("reicalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.render(&value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
