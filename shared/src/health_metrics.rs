//! BMI and healthy weight range calculations
//!
//! The healthy range is always computed in kilograms. Callers working in
//! imperial convert it themselves; [`assess_body`] does that conversion for
//! the calculator's result card.
//!
//! # Design Principles
//!
//! 1. **Pure Functions**: All calculations are pure, no side effects
//! 2. **Fixed Constants**: BMI 18.5-24.9 and the 703 imperial factor are contractual
//! 3. **Unit Purity**: Assessment output is expressed in a single unit system

use serde::{Deserialize, Serialize};

use crate::errors::CalculatorError;
use crate::projection::weekly_deficit_loss;
use crate::units::{UnitSystem, METERS_PER_INCH};
use crate::validation::{validate_daily_deficit, validate_height_m, validate_weight, ValidationError};

/// Imperial BMI constant (lb/in² to kg/m²)
pub const BMI_IMPERIAL_FACTOR: f64 = 703.0;

/// Lower bound of the healthy BMI range
pub const HEALTHY_BMI_MIN: f64 = 18.5;

/// Upper bound of the healthy BMI range
pub const HEALTHY_BMI_MAX: f64 = 24.9;

// ============================================================================
// BMI Calculations
// ============================================================================

/// BMI category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    SeverelyUnderweight,
    Underweight,
    Normal,
    Overweight,
    ObeseClass1,
    ObeseClass2,
    ObeseClass3,
}

impl BmiCategory {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            BmiCategory::SeverelyUnderweight => "Severely Underweight",
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal/Healthy",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::ObeseClass1 => "Obese (Class I)",
            BmiCategory::ObeseClass2 => "Obese (Class II)",
            BmiCategory::ObeseClass3 => "Obese (Class III)",
        }
    }
}

/// BMI from kilograms and meters
///
/// Formula: BMI = weight(kg) / height(m)²
pub fn bmi_metric(weight_kg: f64, height_m: f64) -> f64 {
    weight_kg / (height_m * height_m)
}

/// BMI from pounds and inches
///
/// Formula: BMI = 703 × weight(lb) / height(in)²
pub fn bmi_imperial(weight_lb: f64, height_in: f64) -> f64 {
    BMI_IMPERIAL_FACTOR * weight_lb / (height_in * height_in)
}

/// Classify BMI into category
pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 16.0 {
        BmiCategory::SeverelyUnderweight
    } else if bmi < HEALTHY_BMI_MIN {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else if bmi < 35.0 {
        BmiCategory::ObeseClass1
    } else if bmi < 40.0 {
        BmiCategory::ObeseClass2
    } else {
        BmiCategory::ObeseClass3
    }
}

/// Weight bounds for a BMI range, in the unit of the caller's choosing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthyRange {
    pub min: f64,
    pub max: f64,
}

impl HealthyRange {
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min && weight <= self.max
    }
}

/// Healthy weight range in kilograms for BMI 18.5-24.9
pub fn healthy_range_kg(height_m: f64) -> HealthyRange {
    let height_m_sq = height_m * height_m;
    HealthyRange {
        min: HEALTHY_BMI_MIN * height_m_sq,
        max: HEALTHY_BMI_MAX * height_m_sq,
    }
}

// ============================================================================
// Body Assessment
// ============================================================================

/// Calculator result card, entirely in `unit_system`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyAssessment {
    pub unit_system: UnitSystem,
    pub weight: f64,
    pub bmi: f64,
    pub category: BmiCategory,
    pub healthy_range: HealthyRange,
    /// Upper bound of the healthy range
    pub goal_weight: f64,
    /// Zero when already at or under the goal weight
    pub weight_to_lose: f64,
    pub weekly_deficit_loss: f64,
}

/// Assess a body weight against the healthy BMI range.
///
/// `weight` is in the unit system's mass unit; height is always meters.
pub fn assess_body(
    unit_system: UnitSystem,
    weight: f64,
    height_m: f64,
    daily_deficit_kcal: f64,
) -> Result<BodyAssessment, CalculatorError> {
    validate_weight(unit_system, weight).map_err(|m| ValidationError::new("weight", &m))?;
    validate_height_m(height_m).map_err(|m| ValidationError::new("height", &m))?;
    validate_daily_deficit(daily_deficit_kcal)
        .map_err(|m| ValidationError::new("daily_deficit_kcal", &m))?;

    let bmi = match unit_system {
        UnitSystem::Imperial => bmi_imperial(weight, height_m / METERS_PER_INCH),
        UnitSystem::Metric => bmi_metric(weight, height_m),
    };

    let range_kg = healthy_range_kg(height_m);
    let healthy_range = HealthyRange {
        min: unit_system.from_kg(range_kg.min),
        max: unit_system.from_kg(range_kg.max),
    };

    Ok(BodyAssessment {
        unit_system,
        weight,
        bmi,
        category: classify_bmi(bmi),
        healthy_range,
        goal_weight: healthy_range.max,
        weight_to_lose: (weight - healthy_range.max).max(0.0),
        weekly_deficit_loss: weekly_deficit_loss(unit_system, daily_deficit_kcal),
    })
}
