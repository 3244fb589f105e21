//! GLP-1 weight projection calculator
//!
//! Command-line host for the calculator engine. Useful for support and for
//! checking projections outside the browser.

use anyhow::Result;
use clap::{ArgAction, Parser};
use glp1_calculator_cli::commands::{self, Command, Context};
use glp1_calculator_cli::config::CalculatorConfig;
use glp1_calculator_shared::{RateTable, UnitSystem};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "glp1-calc")]
#[command(about = "Weight projections for titrating GLP-1 peptides plus a calorie deficit")]
#[command(version)]
struct Cli {
    /// Unit system for every input and output (imperial or metric)
    #[arg(long, global = true)]
    unit: Option<UnitSystem>,

    /// Print JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config = CalculatorConfig::load()?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        env = if CalculatorConfig::is_production() { "production" } else { "development" },
        "Starting GLP-1 calculator"
    );

    validate_rate_tables()?;

    let ctx = Context::new(config, cli.unit, cli.json);
    let output = commands::run(&cli.command, &ctx)?;
    println!("{}", output);

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "glp1_calculator_cli=debug,glp1_calculator_shared=debug".into()
        } else {
            "glp1_calculator_cli=info,glp1_calculator_shared=info".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if CalculatorConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

/// The rate tables are compiled in; a bad table is fatal before any command runs
fn validate_rate_tables() -> Result<()> {
    match RateTable::builtin() {
        Ok(table) => {
            debug!(peptides = table.peptides().count(), "Rate tables loaded");
            Ok(())
        }
        Err(err) => {
            error!("Configuration error: {}", err);
            anyhow::bail!("Invalid rate tables")
        }
    }
}
