//! Subcommands of `glp1-calc`
//!
//! Each command returns the text to print, either a plain-text report or
//! JSON. Nothing here writes to stdout directly.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::fmt::Write;
use thiserror::Error;
use tracing::debug;

use glp1_calculator_shared::{
    assess_body, healthy_range_kg, parse_height_m, project_by_windows, weeks_to_goal_with_ramp,
    BodyAssessment, Modifiers, ProjectionRequest, ProjectionResult, RateTable, UnitSystem,
    WeeksToGoal, MAX_SIMULATION_WEEKS,
};

use crate::config::CalculatorConfig;

/// Errors from resolving command-line input
#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Goal weight required: pass --goal, or --height to target the top of the healthy range")]
    MissingGoal,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// BMI, healthy weight range and goal weight
    Assess(AssessArgs),
    /// Weeks needed to reach the goal weight
    Weeks(ProjectionArgs),
    /// Weight timeline grouped by titration block
    Project(ProjectionArgs),
    /// List known peptides with their rates and titration schedules
    Peptides,
}

#[derive(Args, Debug, Clone)]
pub struct AssessArgs {
    /// Body weight in the selected unit
    #[arg(long)]
    pub weight: f64,

    /// Height as feet.inches (imperial, e.g. 5.10) or centimeters (metric)
    #[arg(long)]
    pub height: String,

    /// Daily calorie deficit in kcal
    #[arg(long, allow_negative_numbers = true)]
    pub deficit: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectionArgs {
    /// Starting weight in the selected unit
    #[arg(long)]
    pub start: f64,

    /// Goal weight in the selected unit
    #[arg(long)]
    pub goal: Option<f64>,

    /// Height used to pick the goal when --goal is absent
    #[arg(long, required_unless_present = "goal")]
    pub height: Option<String>,

    /// Peptide key, e.g. semaglutide
    #[arg(long)]
    pub peptide: Option<String>,

    /// Daily calorie deficit in kcal
    #[arg(long, allow_negative_numbers = true)]
    pub deficit: Option<f64>,

    /// Use the full-dose rate from week one
    #[arg(long)]
    pub no_ramp: bool,

    /// Hold the dose one extra week at the first escalation
    #[arg(long)]
    pub gi_hold: bool,

    /// Take week 9 off treatment
    #[arg(long)]
    pub pause: bool,
}

/// How command results are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json { pretty: bool },
}

/// Settings shared by every command, flags already merged over config
#[derive(Debug, Clone)]
pub struct Context {
    pub config: CalculatorConfig,
    pub unit_system: UnitSystem,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(config: CalculatorConfig, unit_system: Option<UnitSystem>, json: bool) -> Self {
        let unit_system = unit_system.unwrap_or(config.defaults.unit_system);
        let format = if json {
            OutputFormat::Json {
                pretty: config.output.pretty_json,
            }
        } else {
            OutputFormat::Text
        };
        Self {
            config,
            unit_system,
            format,
        }
    }

    fn render<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(text()),
            OutputFormat::Json { pretty: true } => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Json { pretty: false } => Ok(serde_json::to_string(value)?),
        }
    }
}

/// Run one subcommand
pub fn run(command: &Command, ctx: &Context) -> Result<String> {
    match command {
        Command::Assess(args) => run_assess(args, ctx),
        Command::Weeks(args) => run_weeks(args, ctx),
        Command::Project(args) => run_project(args, ctx),
        Command::Peptides => list_peptides(ctx),
    }
}

// ============================================================================
// Assess
// ============================================================================

pub fn run_assess(args: &AssessArgs, ctx: &Context) -> Result<String> {
    let height_m = parse_height_m(ctx.unit_system, &args.height)?;
    let deficit = args.deficit.unwrap_or(ctx.config.defaults.daily_deficit_kcal);
    let assessment = assess_body(ctx.unit_system, args.weight, height_m, deficit)?;

    debug!(
        bmi = assessment.bmi,
        category = ?assessment.category,
        "Assessed body weight"
    );
    ctx.render(&assessment, || assessment_text(&assessment))
}

fn assessment_text(a: &BodyAssessment) -> String {
    let unit = a.unit_system.weight_label();
    let mut out = String::new();
    let _ = writeln!(out, "Weight:         {:.1} {}", a.weight, unit);
    let _ = writeln!(out, "BMI:            {:.1} ({})", a.bmi, a.category.description());
    let _ = writeln!(
        out,
        "Healthy range:  {:.1} - {:.1} {}",
        a.healthy_range.min, a.healthy_range.max, unit
    );
    let _ = writeln!(out, "Goal weight:    {:.1} {}", a.goal_weight, unit);
    let _ = writeln!(out, "To lose:        {:.1} {}", a.weight_to_lose, unit);
    let _ = write!(out, "Deficit loss:   {:.2} {}/week", a.weekly_deficit_loss, unit);
    out
}

// ============================================================================
// Weeks and Projection
// ============================================================================

/// Merge projection flags over the configured defaults
pub fn resolve_request(args: &ProjectionArgs, ctx: &Context) -> Result<ProjectionRequest> {
    let defaults = &ctx.config.defaults;
    let goal_weight = match (args.goal, args.height.as_deref()) {
        (Some(goal), _) => goal,
        (None, Some(height)) => {
            let range = healthy_range_kg(parse_height_m(ctx.unit_system, height)?);
            ctx.unit_system.from_kg(range.max)
        }
        (None, None) => return Err(CommandError::MissingGoal.into()),
    };

    let peptide = args.peptide.as_deref().unwrap_or(&defaults.peptide);
    let deficit = args.deficit.unwrap_or(defaults.daily_deficit_kcal);

    Ok(
        ProjectionRequest::new(args.start, goal_weight, peptide, ctx.unit_system, deficit)
            .with_modifiers(Modifiers {
                use_ramp: defaults.use_ramp && !args.no_ramp,
                gi_hold: args.gi_hold,
                pause: args.pause,
            }),
    )
}

#[derive(Debug, Serialize)]
struct WeeksReport<'a> {
    unit_system: UnitSystem,
    peptide: &'a str,
    start_weight: f64,
    goal_weight: f64,
    weeks: WeeksToGoal,
}

pub fn run_weeks(args: &ProjectionArgs, ctx: &Context) -> Result<String> {
    let request = resolve_request(args, ctx)?;
    let weeks = weeks_to_goal_with_ramp(&request)?;

    let report = WeeksReport {
        unit_system: request.unit_system,
        peptide: &request.peptide,
        start_weight: request.start_weight,
        goal_weight: request.goal_weight,
        weeks,
    };
    ctx.render(&report, || {
        let unit = request.unit_system.weight_label();
        format!(
            "{} from {:.1} {} to {:.1} {}: {}",
            request.peptide,
            request.start_weight,
            unit,
            request.goal_weight,
            unit,
            weeks_text(weeks)
        )
    })
}

pub fn run_project(args: &ProjectionArgs, ctx: &Context) -> Result<String> {
    let request = resolve_request(args, ctx)?;
    let projection = project_by_windows(&request)?;
    debug!(windows = projection.windows.len(), "Projected timeline");
    ctx.render(&projection, || projection_text(&request, &projection))
}

fn weeks_text(weeks: WeeksToGoal) -> String {
    match weeks {
        WeeksToGoal::Reached(1) => "1 week".to_string(),
        WeeksToGoal::Reached(n) => format!("{} weeks", n),
        WeeksToGoal::Unreachable => {
            format!("goal not reached within {} weeks", MAX_SIMULATION_WEEKS)
        }
    }
}

fn projection_text(request: &ProjectionRequest, projection: &ProjectionResult) -> String {
    let unit = projection.unit_system.weight_label();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}): {}, ending at {:.1} {}",
        request.peptide,
        projection.unit_system,
        weeks_text(projection.weeks),
        projection.end_weight,
        unit
    );
    let _ = write!(
        out,
        "{:<12} {:>9} {:>9} {:>6} {:>9} {:>9} {:>9}",
        "Window", "Start", "End", "Dose", "Peptide", "Deficit", "Total"
    );
    for w in &projection.windows {
        let _ = write!(
            out,
            "\n{:<12} {:>9.2} {:>9.2} {:>6.2} {:>9.2} {:>9.2} {:>9.2}",
            w.label,
            w.start_weight,
            w.end_weight,
            w.rate_factor,
            w.peptide_loss,
            w.deficit_loss,
            w.total_loss
        );
    }
    out
}

// ============================================================================
// Peptides
// ============================================================================

#[derive(Debug, Serialize)]
struct PeptideEntry<'a> {
    peptide: &'a str,
    unit_system: UnitSystem,
    weekly_rate: f64,
    titration: &'a [f64],
}

pub fn list_peptides(ctx: &Context) -> Result<String> {
    let table = RateTable::builtin()?;
    let entries: Vec<PeptideEntry> = table
        .profiles()
        .map(|p| PeptideEntry {
            peptide: &p.key,
            unit_system: ctx.unit_system,
            weekly_rate: ctx.unit_system.from_pounds(p.base_weekly_rate_lb),
            titration: &p.titration,
        })
        .collect();

    ctx.render(&entries, || {
        let mut out = format!(
            "{:<14} {:>12}  Titration",
            "Peptide",
            format!("{}/week", ctx.unit_system.weight_label())
        );
        for e in &entries {
            let steps: Vec<String> = e.titration.iter().map(|m| format!("{:.2}", m)).collect();
            let _ = write!(out, "\n{:<14} {:>12.2}  {}", e.peptide, e.weekly_rate, steps.join(" "));
        }
        out
    })
}
