//! Configuration management for the GLP-1 calculator CLI
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: GLP1__)
//!
//! Command-line flags override all of these.

use anyhow::Result;
use config::builder::DefaultState;
use config::ConfigBuilder;
use glp1_calculator_shared::validation::validate_daily_deficit;
use glp1_calculator_shared::{RateTable, UnitSystem};
use serde::{Deserialize, Serialize};
use std::env;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Values used when a flag is not given
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub unit_system: UnitSystem,
    pub peptide: String,
    pub daily_deficit_kcal: f64,
    pub use_ramp: bool,
}

/// Output formatting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indent JSON output
    pub pretty_json: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig {
                unit_system: UnitSystem::Imperial,
                peptide: "semaglutide".to_string(),
                daily_deficit_kcal: 500.0,
                use_ramp: true,
            },
            output: OutputConfig::default(),
        }
    }
}

impl CalculatorConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with GLP1__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);

        let builder = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&CalculatorConfig::default())?)
            // Load from environment-specific config file
            .add_source(config::File::with_name(&config_file).required(false))
            // Override with environment variables (GLP1__ prefix)
            // e.g., GLP1__DEFAULTS__PEPTIDE=tirzepatide sets defaults.peptide
            .add_source(config::Environment::with_prefix("GLP1").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject defaults the calculator would refuse at run time
    pub fn validate(&self) -> Result<()> {
        RateTable::builtin()?.profile(&self.defaults.peptide)?;
        validate_daily_deficit(self.defaults.daily_deficit_kcal)
            .map_err(|m| anyhow::anyhow!("defaults.daily_deficit_kcal: {}", m))?;
        Ok(())
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }
}
