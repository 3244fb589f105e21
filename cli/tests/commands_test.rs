//! Integration tests for the glp1-calc command layer

mod common;

use common::{TestArgs, TestCli};
use clap::Parser;
use glp1_calculator_cli::commands::{resolve_request, CommandError, Context, ProjectionArgs};
use glp1_calculator_cli::config::CalculatorConfig;
use glp1_calculator_shared::{weeks_to_goal_with_ramp, UnitSystem, WeeksToGoal};
use proptest::prelude::*;
use rstest::rstest;

// =========================================================================
// Argument Parsing Tests
// =========================================================================

#[test]
fn test_projection_requires_goal_or_height() {
    let result = TestArgs::try_parse_from(["glp1-calc", "weeks", "--start", "200"]);
    assert!(result.is_err());

    let result = TestArgs::try_parse_from(["glp1-calc", "weeks", "--start", "200", "--goal", "150"]);
    assert!(result.is_ok());
}

#[test]
fn test_negative_deficit_is_accepted() {
    let output = TestCli::new()
        .text(&["weeks", "--start", "200", "--goal", "150", "--deficit", "-250"])
        .unwrap();
    assert!(output.contains("weeks"));
}

// =========================================================================
// Assess Tests
// =========================================================================

#[test]
fn test_assess_text_report() {
    let output = TestCli::new()
        .text(&["assess", "--weight", "150", "--height", "5.9"])
        .unwrap();

    assert!(output.contains("Normal/Healthy"));
    assert!(output.contains("Healthy range:  125."));
    assert!(!output.contains("kg"));
}

#[test]
fn test_assess_metric_json() {
    let value = TestCli::metric().json(&["assess", "--weight", "100", "--height", "185"]);

    assert_eq!(value["unit_system"], "metric");
    assert_eq!(value["category"], "overweight");
    let goal = value["goal_weight"].as_f64().unwrap();
    assert!((goal - 85.2).abs() < 0.1);
}

#[rstest]
#[case("", "Missing height")]
#[case("5'10", "Invalid height")]
#[case("tall", "Invalid height")]
fn test_assess_height_errors(#[case] height: &str, #[case] prefix: &str) {
    let err = TestCli::new()
        .text(&["assess", "--weight", "180", "--height", height])
        .unwrap_err();
    assert!(err.to_string().starts_with(prefix), "got: {}", err);
}

// =========================================================================
// Weeks Tests
// =========================================================================

#[test]
fn test_weeks_to_upper_healthy_bound() {
    let value = TestCli::new().json(&[
        "weeks", "--start", "205", "--height", "6.1", "--peptide", "retatrutide",
    ]);

    let weeks = value["weeks"].as_u64().unwrap();
    assert!(weeks > 8 && weeks < 15, "got {} weeks", weeks);
    assert_eq!(value["peptide"], "retatrutide");
}

#[test]
fn test_weeks_matches_library_solver() {
    let args = ProjectionArgs {
        start: 240.0,
        goal: Some(180.0),
        peptide: Some("tirzepatide".to_string()),
        gi_hold: true,
        ..ProjectionArgs::default()
    };
    let ctx = Context::new(CalculatorConfig::default(), None, true);
    let request = resolve_request(&args, &ctx).unwrap();

    let value = TestCli::new().json(&[
        "weeks", "--start", "240", "--goal", "180", "--peptide", "tirzepatide", "--gi-hold",
    ]);
    let expected = weeks_to_goal_with_ramp(&request).unwrap().weeks().unwrap();
    assert_eq!(value["weeks"].as_u64().unwrap(), u64::from(expected));
}

#[test]
fn test_weeks_unknown_peptide() {
    let err = TestCli::new()
        .text(&["weeks", "--start", "200", "--goal", "150", "--peptide", "bpc-157"])
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown peptide: bpc-157");
}

#[test]
fn test_missing_goal_without_clap() {
    let args = ProjectionArgs {
        start: 200.0,
        ..ProjectionArgs::default()
    };
    let ctx = Context::new(CalculatorConfig::default(), None, false);
    let err = resolve_request(&args, &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<CommandError>(), Some(&CommandError::MissingGoal));
}

// =========================================================================
// Projection Tests
// =========================================================================

#[test]
fn test_project_json_windows() {
    let value = TestCli::new().json(&["project", "--start", "200", "--goal", "150"]);

    assert_eq!(value["unit_system"], "imperial");
    assert_eq!(value["end_weight"], 150.0);
    let windows = value["windows"].as_array().unwrap();
    assert!(!windows.is_empty());
    assert_eq!(windows[0]["label"], "Weeks 1-4");

    for window in windows {
        let total = window["total_loss"].as_f64().unwrap();
        let parts = window["peptide_loss"].as_f64().unwrap() + window["deficit_loss"].as_f64().unwrap();
        assert!((total - parts).abs() <= 0.1);
    }
}

#[test]
fn test_project_text_table() {
    let output = TestCli::new()
        .text(&["project", "--start", "200", "--goal", "150", "--pause"])
        .unwrap();

    assert!(output.starts_with("semaglutide (imperial)"));
    assert!(output.contains("Week 9 "));
    assert!(output.contains("Weeks 1-4"));
}

#[test]
fn test_project_metric_is_unit_pure() {
    let value = TestCli::metric().json(&["project", "--start", "90", "--goal", "70"]);
    let json = value.to_string();
    assert!(!json.contains("lb"));
    assert!(json.contains("metric"));
}

#[test]
fn test_no_ramp_is_faster() {
    let cli = TestCli::new();
    let ramp = cli.json(&["weeks", "--start", "250", "--goal", "180"]);
    let flat = cli.json(&["weeks", "--start", "250", "--goal", "180", "--no-ramp"]);
    assert!(flat["weeks"].as_u64().unwrap() <= ramp["weeks"].as_u64().unwrap());
}

// =========================================================================
// Configuration Defaults Tests
// =========================================================================

#[test]
fn test_configured_defaults_apply() {
    let mut cli = TestCli::new();
    cli.config.defaults.peptide = "tirzepatide".to_string();
    cli.config.defaults.unit_system = UnitSystem::Metric;
    cli.config.defaults.daily_deficit_kcal = 0.0;

    let value = cli.json(&["weeks", "--start", "100", "--goal", "90"]);
    assert_eq!(value["peptide"], "tirzepatide");
    assert_eq!(value["unit_system"], "metric");
}

#[test]
fn test_flags_override_configured_unit() {
    let mut cli = TestCli::new();
    cli.config.defaults.unit_system = UnitSystem::Metric;
    cli.unit_system = Some(UnitSystem::Imperial);

    let value = cli.json(&["weeks", "--start", "200", "--goal", "150"]);
    assert_eq!(value["unit_system"], "imperial");
}

#[test]
fn test_pretty_json_output() {
    let mut config = CalculatorConfig::default();
    config.output.pretty_json = true;
    let ctx = Context::new(config, None, true);

    let output = glp1_calculator_cli::commands::list_peptides(&ctx).unwrap();
    assert!(output.contains("\n  "));
}

// =========================================================================
// Peptides Tests
// =========================================================================

#[test]
fn test_peptides_listing() {
    let output = TestCli::new().text(&["peptides"]).unwrap();
    assert!(output.contains("lb/week"));
    for key in ["semaglutide", "tirzepatide", "retatrutide"] {
        assert!(output.contains(key));
    }
}

#[test]
fn test_peptides_metric_rates() {
    let value = TestCli::metric().json(&["peptides"]);
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        assert_eq!(entry["unit_system"], "metric");
        assert!(entry["weekly_rate"].as_f64().unwrap() > 0.0);
    }
}

#[test]
fn test_unreachable_weeks_reported() {
    let _guard = glp1_calculator_shared::override_base_rate("semaglutide", 0.0).unwrap();
    let cli = TestCli::new();

    let value = cli.json(&["weeks", "--start", "200", "--goal", "150", "--deficit", "0"]);
    assert!(value["weeks"].is_null());

    let output = cli
        .text(&["weeks", "--start", "200", "--goal", "150", "--deficit", "0"])
        .unwrap();
    assert!(output.ends_with("goal not reached within 10000 weeks"));
    assert_eq!(
        weeks_to_goal_with_ramp(&glp1_calculator_shared::ProjectionRequest::new(
            200.0,
            150.0,
            "semaglutide",
            UnitSystem::Imperial,
            0.0
        ))
        .unwrap(),
        WeeksToGoal::Unreachable
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: `weeks` output always agrees with the library solver
    #[test]
    fn prop_weeks_json_matches_solver(
        start in 150.0f64..400.0,
        to_lose in 1.0f64..100.0,
        deficit in -500.0f64..1500.0,
        peptide in prop::sample::select(vec!["semaglutide", "tirzepatide", "retatrutide"]),
        no_ramp in any::<bool>(),
        gi_hold in any::<bool>(),
        pause in any::<bool>(),
    ) {
        let goal = start - to_lose;
        let start_arg = start.to_string();
        let goal_arg = goal.to_string();
        let deficit_arg = deficit.to_string();
        let mut argv = vec![
            "weeks", "--start", &start_arg, "--goal", &goal_arg,
            "--peptide", peptide, "--deficit", &deficit_arg,
        ];
        if no_ramp {
            argv.push("--no-ramp");
        }
        if gi_hold {
            argv.push("--gi-hold");
        }
        if pause {
            argv.push("--pause");
        }

        let args = ProjectionArgs {
            start,
            goal: Some(goal),
            peptide: Some(peptide.to_string()),
            deficit: Some(deficit),
            no_ramp,
            gi_hold,
            pause,
            ..ProjectionArgs::default()
        };
        let ctx = Context::new(CalculatorConfig::default(), None, true);
        let expected = weeks_to_goal_with_ramp(&resolve_request(&args, &ctx).unwrap()).unwrap();

        let value = TestCli::new().json(&argv);
        prop_assert_eq!(value["weeks"].as_u64(), expected.weeks().map(u64::from));
    }
}
