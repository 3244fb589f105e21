//! GLP-1 Calculator WASM Module
//!
//! Browser bindings for the calculator page. Functions return primitives or
//! JSON strings; failures surface as `JsError` carrying the same message the
//! native error displays.

use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;

use glp1_calculator_shared::{
    self as shared, assess_body, parse_feet_inches, parse_height_m, project_by_windows,
    weeks_to_goal_with_ramp, CalculatorError, HeightError, Modifiers, ProjectionRequest,
    RateTable, UnitSystem,
};

/// Errors raised while decoding arguments from the page
#[derive(Error, Debug)]
pub enum BindingError {
    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error("{0}")]
    UnitSystem(String),

    #[error("Invalid request: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<HeightError> for BindingError {
    fn from(err: HeightError) -> Self {
        BindingError::Calculator(err.into())
    }
}

fn unit_system(value: &str) -> Result<UnitSystem, BindingError> {
    value.parse().map_err(BindingError::UnitSystem)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, BindingError> {
    Ok(serde_json::to_string(value)?)
}

// ============================================================================
// Height and BMI
// ============================================================================

/// Parse a `feet.inches` height into total inches
#[wasm_bindgen]
pub fn parse_height_inches(input: &str) -> Result<u32, JsError> {
    Ok(parse_feet_inches(input)?.total_inches())
}

/// BMI from pounds and inches
#[wasm_bindgen]
pub fn bmi_imperial(weight_lb: f64, height_in: f64) -> f64 {
    shared::bmi_imperial(weight_lb, height_in)
}

/// BMI from kilograms and meters
#[wasm_bindgen]
pub fn bmi_metric(weight_kg: f64, height_m: f64) -> f64 {
    shared::bmi_metric(weight_kg, height_m)
}

/// Result card for the calculator page as JSON.
///
/// `height` is `feet.inches` for imperial and centimeters for metric.
#[wasm_bindgen]
pub fn assess(
    unit: &str,
    weight: f64,
    height: &str,
    daily_deficit_kcal: f64,
) -> Result<String, JsError> {
    Ok(assess_json(unit, weight, height, daily_deficit_kcal)?)
}

fn assess_json(
    unit: &str,
    weight: f64,
    height: &str,
    daily_deficit_kcal: f64,
) -> Result<String, BindingError> {
    let unit_system = unit_system(unit)?;
    let height_m = parse_height_m(unit_system, height)?;
    to_json(&assess_body(unit_system, weight, height_m, daily_deficit_kcal)?)
}

// ============================================================================
// Projection
// ============================================================================

/// Weekly loss from a daily deficit, in the unit system's mass unit
#[wasm_bindgen]
pub fn weekly_deficit_loss(unit: &str, daily_deficit_kcal: f64) -> Result<f64, JsError> {
    let unit_system = unit_system(unit)?;
    Ok(shared::weekly_deficit_loss(unit_system, daily_deficit_kcal))
}

/// Weeks to reach the goal weight, `Infinity` when it is never reached
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn weeks_to_goal(
    start_weight: f64,
    goal_weight: f64,
    peptide: &str,
    unit: &str,
    daily_deficit_kcal: f64,
    use_ramp: bool,
    gi_hold: bool,
    pause: bool,
) -> Result<f64, JsError> {
    let request = ProjectionRequest::new(
        start_weight,
        goal_weight,
        peptide,
        unit_system(unit)?,
        daily_deficit_kcal,
    )
    .with_modifiers(Modifiers {
        use_ramp,
        gi_hold,
        pause,
    });
    Ok(weeks_for(&request)?)
}

fn weeks_for(request: &ProjectionRequest) -> Result<f64, BindingError> {
    Ok(weeks_to_goal_with_ramp(request)?.as_f64())
}

/// Windowed timeline for a JSON-encoded projection request
#[wasm_bindgen]
pub fn project_timeline(request_json: &str) -> Result<String, JsError> {
    Ok(project_timeline_json(request_json)?)
}

fn project_timeline_json(request_json: &str) -> Result<String, BindingError> {
    let request: ProjectionRequest = serde_json::from_str(request_json)?;
    to_json(&project_by_windows(&request)?)
}

/// Known peptide keys as a JSON array
#[wasm_bindgen]
pub fn peptide_keys() -> Result<String, JsError> {
    Ok(peptide_keys_json()?)
}

fn peptide_keys_json() -> Result<String, BindingError> {
    let table = RateTable::builtin().map_err(CalculatorError::from)?;
    to_json(&table.peptides().collect::<Vec<_>>())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn parse_height_in_browser() {
        assert_eq!(parse_height_inches("5.10").unwrap(), 70);
        assert!(parse_height_inches("abc").is_err());
    }

    #[wasm_bindgen_test]
    fn weeks_in_browser() {
        let weeks = weeks_to_goal(200.0, 150.0, "semaglutide", "imperial", 500.0, true, false, false)
            .unwrap();
        assert!(weeks.is_finite());
    }
}
