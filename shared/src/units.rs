//! Unit systems and height parsing
//!
//! Every computation runs in exactly one unit system. Values are never
//! mixed: an imperial projection is pounds end to end, a metric one is
//! kilograms end to end.
//!
//! # Design Principles
//!
//! 1. **One System Per Call**: The caller picks imperial or metric up front
//! 2. **Conversion at Boundaries**: Rates are stored in pounds and converted once
//! 3. **Integer Heights**: Feet and inches are parsed as integers, never as decimal feet

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::HeightError;

/// Pounds per kilogram
pub const LB_PER_KG: f64 = 2.20462;

/// Meters per inch
pub const METERS_PER_INCH: f64 = 0.0254;

/// Inches per foot
pub const INCHES_PER_FOOT: u32 = 12;

/// Energy stored in one pound of body mass (kcal)
pub const KCAL_PER_LB: f64 = 3500.0;

/// Energy stored in one kilogram of body mass (kcal)
pub const KCAL_PER_KG: f64 = 7700.0;

// ============================================================================
// Unit System
// ============================================================================

/// Unit system of a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    /// Mass unit label
    pub fn weight_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "lb",
            UnitSystem::Metric => "kg",
        }
    }

    /// Convert a mass in pounds into this system
    pub fn from_pounds(&self, lb: f64) -> f64 {
        match self {
            UnitSystem::Imperial => lb,
            UnitSystem::Metric => lb / LB_PER_KG,
        }
    }

    /// Convert a mass in kilograms into this system
    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            UnitSystem::Imperial => kg * LB_PER_KG,
            UnitSystem::Metric => kg,
        }
    }

    /// Convert a mass in this system into kilograms
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            UnitSystem::Imperial => value / LB_PER_KG,
            UnitSystem::Metric => value,
        }
    }

    /// Energy per unit of body mass (kcal/lb or kcal/kg)
    pub fn kcal_per_mass_unit(&self) -> f64 {
        match self {
            UnitSystem::Imperial => KCAL_PER_LB,
            UnitSystem::Metric => KCAL_PER_KG,
        }
    }

    /// Allowed gap between a window's total loss and the sum of its parts
    pub fn window_tolerance(&self) -> f64 {
        match self {
            UnitSystem::Imperial => 0.1,
            UnitSystem::Metric => 0.05,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "imperial" | "us" | "lb" | "lbs" => Ok(UnitSystem::Imperial),
            "metric" | "si" | "kg" => Ok(UnitSystem::Metric),
            _ => Err(format!("Unknown unit system: {}", s)),
        }
    }
}

// ============================================================================
// Height
// ============================================================================

/// Height in whole feet and inches, inches always in `0..12`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightSpec {
    pub feet: u32,
    pub inches: u32,
}

impl HeightSpec {
    /// Normalize a total inch count into feet and inches
    pub fn from_total_inches(total_inches: u32) -> Self {
        Self {
            feet: total_inches / INCHES_PER_FOOT,
            inches: total_inches % INCHES_PER_FOOT,
        }
    }

    pub fn total_inches(&self) -> u32 {
        self.feet * INCHES_PER_FOOT + self.inches
    }

    pub fn to_meters(&self) -> f64 {
        f64::from(self.total_inches()) * METERS_PER_INCH
    }
}

impl fmt::Display for HeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'{}\"", self.feet, self.inches)
    }
}

impl std::str::FromStr for HeightSpec {
    type Err = HeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_feet_inches(s)
    }
}

/// Parse a `feet[.inches]` height.
///
/// The digits after the separator are whole inches, so `"5.10"` is 5'10"
/// and not 5.1 feet. Inches of 12 or more carry into feet.
pub fn parse_feet_inches(input: &str) -> Result<HeightSpec, HeightError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HeightError::Missing);
    }

    let invalid = || HeightError::InvalidFormat(trimmed.to_string());

    let (feet_part, inches_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let feet = parse_whole_number(feet_part).ok_or_else(invalid)?;
    let inches = if inches_part.is_empty() {
        0
    } else {
        parse_whole_number(inches_part).ok_or_else(invalid)?
    };

    let total_inches = feet
        .checked_mul(INCHES_PER_FOOT)
        .and_then(|f| f.checked_add(inches))
        .ok_or_else(invalid)?;

    Ok(HeightSpec::from_total_inches(total_inches))
}

/// Height in meters from user input: `feet.inches` for imperial,
/// centimeters for metric.
pub fn parse_height_m(unit_system: UnitSystem, input: &str) -> Result<f64, HeightError> {
    match unit_system {
        UnitSystem::Imperial => Ok(parse_feet_inches(input)?.to_meters()),
        UnitSystem::Metric => parse_centimeters(input).map(|cm| cm / 100.0),
    }
}

fn parse_centimeters(input: &str) -> Result<f64, HeightError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HeightError::Missing);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|cm| cm.is_finite() && *cm > 0.0)
        .ok_or_else(|| HeightError::InvalidFormat(trimmed.to_string()))
}

fn parse_whole_number(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
