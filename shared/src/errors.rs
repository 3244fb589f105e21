//! Error types for the GLP-1 calculator

use thiserror::Error;

use crate::validation::ValidationError;

/// Height input errors, surfaced next to the height field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeightError {
    #[error("Missing height: enter feet and inches, e.g. 5.10 for 5'10\"")]
    Missing,

    #[error("Invalid height '{0}': use feet.inches, e.g. 5.10 for 5'10\"")]
    InvalidFormat(String),
}

impl HeightError {
    /// Stable error code for the calling UI
    pub fn code(&self) -> &'static str {
        match self {
            HeightError::Missing => "MISSING_INPUT",
            HeightError::InvalidFormat(_) => "INVALID_FORMAT",
        }
    }
}

/// Rate/titration table errors.
///
/// These are detected when a table is loaded, never per call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Rate and titration tables disagree (no titration: {missing_titration:?}, no rate: {missing_rate:?})")]
    MismatchedKeys {
        missing_titration: Vec<String>,
        missing_rate: Vec<String>,
    },

    #[error("Peptide '{0}' is listed more than once")]
    DuplicatePeptide(String),

    #[error("Base rate for '{peptide}' must be a positive number, got {rate}")]
    NonPositiveRate { peptide: String, rate: f64 },

    #[error("Titration schedule for '{0}' is empty")]
    EmptyTitration(String),

    #[error("Titration multiplier #{index} for '{peptide}' must be a non-negative number, got {value}")]
    InvalidMultiplier {
        peptide: String,
        index: usize,
        value: f64,
    },

    #[error("Override rate for '{peptide}' must be a non-negative number, got {rate}")]
    InvalidOverride { peptide: String, rate: f64 },
}

/// Calculator-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error(transparent)]
    Height(#[from] HeightError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Unknown peptide: {0}")]
    UnknownPeptide(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CalculatorError {
    /// Stable error code, mirrors the API error codes used by the site
    pub fn code(&self) -> &'static str {
        match self {
            CalculatorError::Height(err) => err.code(),
            CalculatorError::Configuration(_) => "CONFIGURATION_ERROR",
            CalculatorError::UnknownPeptide(_) => "UNKNOWN_PEPTIDE",
            CalculatorError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Input field the error belongs to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CalculatorError::Height(_) => Some("height"),
            CalculatorError::UnknownPeptide(_) => Some("peptide"),
            CalculatorError::Validation(err) => Some(err.field.as_str()),
            CalculatorError::Configuration(_) => None,
        }
    }
}
