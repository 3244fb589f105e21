//! Input validation functions
//!
//! Validators return a plain message; [`ValidationError`] attaches the field
//! and its display label so the calculator page can show the message next to
//! the right input.

use thiserror::Error;

use crate::projection::ProjectionRequest;
use crate::units::UnitSystem;

/// Largest daily deficit the calculator accepts (kcal/day)
pub const MAX_DAILY_DEFICIT_KCAL: f64 = 5000.0;

/// Validate a body weight in the unit system's mass unit
pub fn validate_weight(unit_system: UnitSystem, weight: f64) -> Result<(), String> {
    if weight.is_nan() || weight.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    let (min, max) = match unit_system {
        UnitSystem::Imperial => (44.0, 1100.0),
        UnitSystem::Metric => (20.0, 500.0),
    };
    let label = unit_system.weight_label();
    if weight < min {
        return Err(format!("Weight must be at least {} {}", min, label));
    }
    if weight > max {
        return Err(format!("Weight must be at most {} {}", max, label));
    }
    Ok(())
}

/// Validate a daily calorie deficit.
///
/// Zero and negative values are accepted; they simply produce no loss.
pub fn validate_daily_deficit(kcal: f64) -> Result<(), String> {
    if kcal.is_nan() || kcal.is_infinite() {
        return Err("Calorie deficit must be a valid number".to_string());
    }
    if kcal > MAX_DAILY_DEFICIT_KCAL {
        return Err(format!(
            "Calorie deficit cannot exceed {} kcal/day",
            MAX_DAILY_DEFICIT_KCAL
        ));
    }
    Ok(())
}

/// Validate a height in meters
/// Valid range: 0.5-3.0 m
pub fn validate_height_m(height_m: f64) -> Result<(), String> {
    if height_m.is_nan() || height_m.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_m < 0.5 {
        return Err("Height must be at least 0.5 m".to_string());
    }
    if height_m > 3.0 {
        return Err("Height must be at most 3.0 m".to_string());
    }
    Ok(())
}

/// Validate the numeric inputs of a projection request
pub fn validate_projection_request(request: &ProjectionRequest) -> Result<(), ValidationError> {
    validate_weight(request.unit_system, request.start_weight)
        .map_err(|m| ValidationError::new("start_weight", &m))?;
    validate_weight(request.unit_system, request.goal_weight)
        .map_err(|m| ValidationError::new("goal_weight", &m))?;
    validate_daily_deficit(request.daily_deficit_kcal)
        .map_err(|m| ValidationError::new("daily_deficit_kcal", &m))?;
    Ok(())
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "weight" | "start_weight" => "Current Weight",
        "goal_weight" => "Goal Weight",
        "height" => "Height",
        "peptide" => "Peptide",
        "unit_system" => "Units",
        "daily_deficit_kcal" => "Daily Calorie Deficit",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{display_label}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Message suitable for showing under the input field
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_weight_imperial() {
        assert!(validate_weight(UnitSystem::Imperial, 200.0).is_ok());
        assert!(validate_weight(UnitSystem::Imperial, 44.0).is_ok());
        assert!(validate_weight(UnitSystem::Imperial, 1100.0).is_ok());

        assert!(validate_weight(UnitSystem::Imperial, 43.9).is_err());
        assert!(validate_weight(UnitSystem::Imperial, 1100.1).is_err());
        assert!(validate_weight(UnitSystem::Imperial, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_weight_metric_uses_kg_label() {
        let err = validate_weight(UnitSystem::Metric, 10.0).unwrap_err();
        assert_eq!(err, "Weight must be at least 20 kg");

        let err = validate_weight(UnitSystem::Imperial, 10.0).unwrap_err();
        assert_eq!(err, "Weight must be at least 44 lb");
    }

    #[test]
    fn test_validate_daily_deficit() {
        assert!(validate_daily_deficit(500.0).is_ok());
        assert!(validate_daily_deficit(0.0).is_ok());
        assert!(validate_daily_deficit(-250.0).is_ok());

        assert!(validate_daily_deficit(5000.1).is_err());
        assert!(validate_daily_deficit(f64::INFINITY).is_err());
        assert!(validate_daily_deficit(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_height_m() {
        assert!(validate_height_m(1.75).is_ok());
        assert!(validate_height_m(0.5).is_ok());
        assert!(validate_height_m(3.0).is_ok());

        assert!(validate_height_m(0.49).is_err());
        assert!(validate_height_m(3.01).is_err());
        assert!(validate_height_m(-1.0).is_err());
    }

    #[test]
    fn test_validate_projection_request_reports_field() {
        let request = ProjectionRequest::new(200.0, 10.0, "semaglutide", UnitSystem::Imperial, 500.0);
        let err = validate_projection_request(&request).unwrap_err();
        assert_eq!(err.field, "goal_weight");
        assert_eq!(err.display_label, "Goal Weight");
    }

    #[test]
    fn test_field_display_labels() {
        assert_eq!(get_field_display_label("start_weight"), "Current Weight");
        assert_eq!(get_field_display_label("daily_deficit_kcal"), "Daily Calorie Deficit");
        assert_eq!(get_field_display_label("unknown_field"), "unknown_field");
    }

    #[test]
    fn test_validation_error() {
        let err = ValidationError::new("height", "must be at least 0.5 m");
        assert_eq!(err.field, "height");
        assert_eq!(err.display_label, "Height");
        assert_eq!(err.user_message(), "Height: must be at least 0.5 m");
        assert_eq!(err.to_string(), err.user_message());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_valid_metric_weight_range(weight in 20.0f64..=500.0) {
            prop_assert!(validate_weight(UnitSystem::Metric, weight).is_ok());
        }

        #[test]
        fn prop_any_non_positive_deficit_is_valid(kcal in -5000.0f64..=0.0) {
            prop_assert!(validate_daily_deficit(kcal).is_ok());
        }
    }
}
