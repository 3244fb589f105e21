//! Common test utilities for integration tests
//!
//! Wraps the command layer so tests can parse a command line and run it
//! the way `glp1-calc` does, without touching stdout.

use clap::Parser;
use glp1_calculator_cli::commands::{self, Command, Context};
use glp1_calculator_cli::config::CalculatorConfig;
use glp1_calculator_shared::UnitSystem;

/// Subcommand parser mirroring the binary
#[derive(Parser, Debug)]
#[command(name = "glp1-calc")]
pub struct TestArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Test CLI wrapper
pub struct TestCli {
    pub config: CalculatorConfig,
    pub unit_system: Option<UnitSystem>,
}

impl TestCli {
    /// CLI with code defaults only
    pub fn new() -> Self {
        Self {
            config: CalculatorConfig::default(),
            unit_system: None,
        }
    }

    pub fn metric() -> Self {
        Self {
            unit_system: Some(UnitSystem::Metric),
            ..Self::new()
        }
    }

    pub fn parse(args: &[&str]) -> Command {
        let argv = std::iter::once("glp1-calc").chain(args.iter().copied());
        TestArgs::try_parse_from(argv).unwrap().command
    }

    /// Run a command line, returning the text report
    pub fn text(&self, args: &[&str]) -> anyhow::Result<String> {
        let ctx = Context::new(self.config.clone(), self.unit_system, false);
        commands::run(&Self::parse(args), &ctx)
    }

    /// Run a command line, returning parsed JSON output
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let ctx = Context::new(self.config.clone(), self.unit_system, true);
        let output = commands::run(&Self::parse(args), &ctx).unwrap();
        serde_json::from_str(&output).unwrap()
    }
}
