//! Invest Core CLI
//!
//! Command-line SIP / lump sum / step-up calculator

use anyhow::{Context, Result};
use clap::Parser;
use invest_core::projection::{project, InvestmentMode, ProjectionRequest};
use invest_core::scenario::ScenarioRunner;
use invest_core::session::{JsonFileStore, Session};
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "invest_core", version, about = "Project the growth of an investment plan")]
struct Args {
    /// recurring (sip), lump-sum or step-up
    #[arg(long, default_value = "recurring")]
    mode: String,

    /// Monthly contribution, or the principal for lump sum
    #[arg(long)]
    amount: f64,

    /// Expected annual return in percent (12 means 12%)
    #[arg(long, default_value_t = 12.0)]
    rate: f64,

    /// Investment horizon in years
    #[arg(long, default_value_t = 10)]
    years: u32,

    /// Annual step-up in percent (step-up mode only)
    #[arg(long, default_value_t = 0.0)]
    step_up: f64,

    /// Write the yearly breakdown as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the full result as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Comma-separated rates to compare, e.g. 8,10,12
    #[arg(long, value_delimiter = ',')]
    sweep: Vec<f64>,

    /// Directory used to remember the last projection between runs
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mode: InvestmentMode = args.mode.parse()?;
    let request = ProjectionRequest::from_parts(mode, args.amount, args.rate, args.years, args.step_up);
    let result = project(&request)?;

    println!("Investment Projection ({}, {} years at {}%)", mode, args.years, args.rate);
    println!("{}", "=".repeat(56));

    let summary = result.summary();
    println!("  Total Contributed: {:>14.0}", summary.total_contributed);
    println!("  Total Growth:      {:>14.0}", summary.total_growth);
    println!("  Final Value:       {:>14.0}", summary.final_value);
    println!("  Absolute Return:   {:>13.2}%", summary.absolute_return_percent);
    println!("  Wealth Multiple:   {:>13.2}x", summary.wealth_multiple);
    if let Some(annualized) = summary.annualized_return_percent {
        println!("  Annualized Return: {:>13.2}%", annualized);
    }
    println!();

    println!("{:>4} {:>16} {:>16} {:>16}", "Year", "Contributed", "Growth", "Total");
    println!("{}", "-".repeat(56));
    for row in &result.yearly_breakdown {
        println!(
            "{:>4} {:>16.0} {:>16.0} {:>16.0}",
            row.year, row.contributed, row.growth, row.total
        );
    }

    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("Unable to create {:?}", path))?;
        result.write_breakdown_csv(file)?;
        println!("\nBreakdown written to: {:?}", path);
    }

    if let Some(path) = &args.json {
        let file = File::create(path).with_context(|| format!("Unable to create {:?}", path))?;
        result.write_json(file)?;
        println!("Result written to: {:?}", path);
    }

    if !args.sweep.is_empty() {
        println!("\nRate Comparison:");
        println!("{:>8} {:>16} {:>16}", "Rate %", "Final Value", "Growth");
        for scenario in ScenarioRunner::new().rate_sweep(&request, &args.sweep) {
            match scenario.result {
                Ok(swept) => println!(
                    "{:>8.2} {:>16.0} {:>16.0}",
                    scenario.annual_rate_percent, swept.final_value, swept.total_growth
                ),
                Err(e) => println!("{:>8.2} {}", scenario.annual_rate_percent, e),
            }
        }
    }

    if let Some(dir) = &args.session_dir {
        let store = JsonFileStore::open(dir).context("Failed to open session directory")?;
        let mut session = Session::load_from(&store)?;
        session.last_projection = Some(result);
        session.save_to(&store)?;
        println!("\nSession saved to: {:?}", store.dir());
    }

    Ok(())
}
