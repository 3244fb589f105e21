//! Weight projection under a titrating peptide plus a calorie deficit
//!
//! Both entry points replay the same week-by-week simulation:
//!
//! - [`weeks_to_goal_with_ramp`] returns only the number of weeks needed
//! - [`project_by_windows`] groups the weeks into timeline windows aligned
//!   to titration blocks
//!
//! Each simulated week loses the titrated peptide rate plus the
//! deficit-driven loss. The simulation stops at the goal weight or after
//! [`MAX_SIMULATION_WEEKS`], which stands in for "never".

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::errors::CalculatorError;
use crate::titration::{block_index, with_active_table, PeptideProfile, RateTable, TITRATION_BLOCK_WEEKS};
use crate::units::UnitSystem;
use crate::validation::validate_projection_request;

/// Simulation cap; not reaching the goal by then counts as unreachable
pub const MAX_SIMULATION_WEEKS: u32 = 10_000;

/// Titration clock week from which a GI hold delays escalation by one week
pub const GI_HOLD_WEEK: u32 = 5;

/// Calendar week taken off treatment when `pause` is set
pub const PAUSE_WEEK: u32 = 9;

// ============================================================================
// Deficit-Driven Loss
// ============================================================================

/// Weekly mass loss from a daily calorie deficit.
///
/// 3500 kcal per lb, 7700 kcal per kg. Non-positive deficits lose nothing.
pub fn weekly_deficit_loss(unit_system: UnitSystem, daily_deficit_kcal: f64) -> f64 {
    if daily_deficit_kcal <= 0.0 {
        return 0.0;
    }
    daily_deficit_kcal * 7.0 / unit_system.kcal_per_mass_unit()
}

// ============================================================================
// Request Types
// ============================================================================

/// Dosing modifiers for a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Follow the titration schedule instead of the flat full-dose rate
    pub use_ramp: bool,
    /// Hold the dose one extra week at the first escalation
    pub gi_hold: bool,
    /// Take week 9 off treatment entirely
    pub pause: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            use_ramp: true,
            gi_hold: false,
            pause: false,
        }
    }
}

/// Inputs shared by the solver and the windowed projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    /// Starting weight in the unit system's mass unit
    pub start_weight: f64,
    /// Goal weight in the unit system's mass unit
    pub goal_weight: f64,
    pub peptide: String,
    pub unit_system: UnitSystem,
    pub daily_deficit_kcal: f64,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl ProjectionRequest {
    pub fn new(
        start_weight: f64,
        goal_weight: f64,
        peptide: &str,
        unit_system: UnitSystem,
        daily_deficit_kcal: f64,
    ) -> Self {
        Self {
            start_weight,
            goal_weight,
            peptide: peptide.to_string(),
            unit_system,
            daily_deficit_kcal,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Outcome of the goal-seeking solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum WeeksToGoal {
    /// Goal reached during this week (0 when already at goal)
    Reached(u32),
    /// Weight never reaches the goal within the simulation cap
    Unreachable,
}

impl WeeksToGoal {
    pub fn weeks(&self) -> Option<u32> {
        match self {
            WeeksToGoal::Reached(weeks) => Some(*weeks),
            WeeksToGoal::Unreachable => None,
        }
    }

    /// Week count as a float, `f64::INFINITY` when unreachable
    pub fn as_f64(&self) -> f64 {
        self.weeks().map_or(f64::INFINITY, f64::from)
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, WeeksToGoal::Reached(_))
    }
}

impl From<Option<u32>> for WeeksToGoal {
    fn from(weeks: Option<u32>) -> Self {
        weeks.map_or(WeeksToGoal::Unreachable, WeeksToGoal::Reached)
    }
}

impl From<WeeksToGoal> for Option<u32> {
    fn from(weeks: WeeksToGoal) -> Self {
        weeks.weeks()
    }
}

// ============================================================================
// Weekly Simulation
// ============================================================================

/// One simulated week
#[derive(Debug, Clone, Copy, PartialEq)]
struct WeekStep {
    week: u32,
    /// Titration block the week reports under (not clamped to the schedule)
    block: usize,
    rate_factor: f64,
    peptide_loss: f64,
    deficit_loss: f64,
}

impl WeekStep {
    fn total_loss(&self) -> f64 {
        self.peptide_loss + self.deficit_loss
    }
}

/// Week-by-week loss schedule, capped at [`MAX_SIMULATION_WEEKS`]
struct WeeklySchedule<'a> {
    profile: &'a PeptideProfile,
    unit_system: UnitSystem,
    modifiers: Modifiers,
    deficit_loss: f64,
    week: u32,
    /// Weeks on treatment so far; paused weeks do not advance it
    clock: u32,
}

impl<'a> WeeklySchedule<'a> {
    fn new(profile: &'a PeptideProfile, request: &ProjectionRequest) -> Self {
        Self {
            profile,
            unit_system: request.unit_system,
            modifiers: request.modifiers,
            deficit_loss: weekly_deficit_loss(request.unit_system, request.daily_deficit_kcal),
            week: 0,
            clock: 0,
        }
    }

    fn titration_week(&self) -> u32 {
        let clock = self.clock.max(1);
        if self.modifiers.gi_hold && clock >= GI_HOLD_WEEK {
            clock - 1
        } else {
            clock
        }
    }
}

impl Iterator for WeeklySchedule<'_> {
    type Item = WeekStep;

    fn next(&mut self) -> Option<WeekStep> {
        if self.week >= MAX_SIMULATION_WEEKS {
            return None;
        }
        self.week += 1;

        let paused = self.modifiers.pause && self.week == PAUSE_WEEK;
        if !paused {
            self.clock += 1;
        }

        let titration_week = self.titration_week();
        let rate_factor = if self.modifiers.use_ramp {
            self.profile.multiplier_for_week(titration_week)
        } else {
            1.0
        };

        let (peptide_loss, deficit_loss) = if paused {
            (0.0, 0.0)
        } else {
            let rate_lb = self.profile.base_weekly_rate_lb * rate_factor;
            (self.unit_system.from_pounds(rate_lb), self.deficit_loss)
        };

        Some(WeekStep {
            week: self.week,
            block: block_index(titration_week),
            rate_factor,
            peptide_loss,
            deficit_loss,
        })
    }
}

// ============================================================================
// Goal-Seeking Solver
// ============================================================================

/// Weeks needed to reach the goal weight, using the active rate table.
///
/// Returns [`WeeksToGoal::Unreachable`] when weight never drops or the goal
/// lies beyond [`MAX_SIMULATION_WEEKS`].
pub fn weeks_to_goal_with_ramp(request: &ProjectionRequest) -> Result<WeeksToGoal, CalculatorError> {
    with_active_table(|table| solve_weeks(table, request))
}

/// [`weeks_to_goal_with_ramp`] against an explicit table
pub fn solve_weeks(table: &RateTable, request: &ProjectionRequest) -> Result<WeeksToGoal, CalculatorError> {
    validate_projection_request(request)?;
    let profile = table.profile(&request.peptide)?;
    let result = solve_validated(profile, request);

    debug!(
        peptide = %profile.key,
        unit_system = %request.unit_system,
        weeks = ?result.weeks(),
        "Solved weeks to goal"
    );
    Ok(result)
}

fn solve_validated(profile: &PeptideProfile, request: &ProjectionRequest) -> WeeksToGoal {
    let to_lose = request.start_weight - request.goal_weight;
    if to_lose <= 0.0 {
        return WeeksToGoal::Reached(0);
    }

    // Without any peptide contribution the projection is linear in the deficit.
    if profile.peak_rate(request.modifiers.use_ramp) <= 0.0 {
        let weekly = weekly_deficit_loss(request.unit_system, request.daily_deficit_kcal);
        if weekly <= 0.0 {
            return WeeksToGoal::Unreachable;
        }
        return deficit_only_weeks(&profile.key, to_lose, weekly, request.modifiers.pause);
    }

    let mut current = request.start_weight;
    for step in WeeklySchedule::new(profile, request) {
        current -= step.total_loss();
        if current <= request.goal_weight {
            return WeeksToGoal::Reached(step.week);
        }
    }

    cap_reached(&profile.key)
}

fn deficit_only_weeks(peptide: &str, to_lose: f64, weekly_loss: f64, pause: bool) -> WeeksToGoal {
    let weeks = (to_lose / weekly_loss).ceil();
    if weeks > f64::from(MAX_SIMULATION_WEEKS) {
        return cap_reached(peptide);
    }

    let mut weeks = weeks as u32;
    if pause && weeks >= PAUSE_WEEK {
        weeks += 1;
    }
    if weeks > MAX_SIMULATION_WEEKS {
        return cap_reached(peptide);
    }
    WeeksToGoal::Reached(weeks)
}

fn cap_reached(peptide: &str) -> WeeksToGoal {
    warn!(
        peptide = %peptide,
        cap = MAX_SIMULATION_WEEKS,
        "Goal weight not reached within the simulation cap"
    );
    WeeksToGoal::Unreachable
}

// ============================================================================
// Windowed Projection
// ============================================================================

/// One timeline window, in the projection's unit system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionWindow {
    pub label: String,
    pub first_week: u32,
    pub last_week: u32,
    pub start_weight: f64,
    pub end_weight: f64,
    pub rate_factor: f64,
    pub peptide_loss: f64,
    pub deficit_loss: f64,
    pub total_loss: f64,
}

/// Windowed projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub unit_system: UnitSystem,
    pub weeks: WeeksToGoal,
    pub end_weight: f64,
    pub windows: Vec<ProjectionWindow>,
}

/// Project the weight timeline in titration-aligned windows, using the
/// active rate table.
///
/// `weeks` always equals [`weeks_to_goal_with_ramp`] for the same request.
/// When the goal is reached the final week is prorated so the timeline ends
/// on the goal weight.
pub fn project_by_windows(request: &ProjectionRequest) -> Result<ProjectionResult, CalculatorError> {
    with_active_table(|table| project_with_table(table, request))
}

/// [`project_by_windows`] against an explicit table
pub fn project_with_table(
    table: &RateTable,
    request: &ProjectionRequest,
) -> Result<ProjectionResult, CalculatorError> {
    let weeks = solve_weeks(table, request)?;
    let profile = table.profile(&request.peptide)?;

    let horizon = match weeks {
        WeeksToGoal::Reached(n) => n,
        WeeksToGoal::Unreachable if is_stalled(profile, request) => 0,
        WeeksToGoal::Unreachable => MAX_SIMULATION_WEEKS,
    };

    let mut builder = WindowBuilder::new(request.unit_system);
    let mut current = request.start_weight;

    for mut step in WeeklySchedule::new(profile, request).take(horizon as usize) {
        if weeks.is_reachable() && step.week == horizon {
            let loss = step.total_loss();
            let fraction = if loss > 0.0 {
                ((current - request.goal_weight) / loss).clamp(0.0, 1.0)
            } else {
                0.0
            };
            step.peptide_loss *= fraction;
            step.deficit_loss *= fraction;
        }
        current = builder.push(current, &step);
    }

    if weeks.is_reachable() && horizon > 0 {
        current = request.goal_weight;
    }

    Ok(ProjectionResult {
        unit_system: request.unit_system,
        weeks,
        end_weight: round2(current),
        windows: builder.finish(current),
    })
}

/// Whether neither the peptide nor the deficit can ever take weight off
fn is_stalled(profile: &PeptideProfile, request: &ProjectionRequest) -> bool {
    profile.peak_rate(request.modifiers.use_ramp) <= 0.0
        && weekly_deficit_loss(request.unit_system, request.daily_deficit_kcal) <= 0.0
}

/// Accumulates weekly steps into windows of at most one titration block
struct WindowBuilder {
    unit_system: UnitSystem,
    windows: Vec<ProjectionWindow>,
    open: Option<OpenWindow>,
}

struct OpenWindow {
    first_week: u32,
    last_week: u32,
    block: usize,
    rate_factor: f64,
    start_weight: f64,
    peptide_loss: f64,
    deficit_loss: f64,
}

impl OpenWindow {
    fn weeks(&self) -> u32 {
        self.last_week - self.first_week + 1
    }

    fn accepts(&self, step: &WeekStep) -> bool {
        step.block == self.block && self.weeks() < TITRATION_BLOCK_WEEKS
    }

    fn into_window(self, end_weight: f64) -> ProjectionWindow {
        let label = if self.first_week == self.last_week {
            format!("Week {}", self.first_week)
        } else {
            format!("Weeks {}-{}", self.first_week, self.last_week)
        };

        ProjectionWindow {
            label,
            first_week: self.first_week,
            last_week: self.last_week,
            start_weight: round2(self.start_weight),
            end_weight: round2(end_weight),
            rate_factor: self.rate_factor,
            peptide_loss: round2(self.peptide_loss),
            deficit_loss: round2(self.deficit_loss),
            total_loss: round2(self.start_weight - end_weight),
        }
    }
}

impl WindowBuilder {
    fn new(unit_system: UnitSystem) -> Self {
        Self {
            unit_system,
            windows: Vec::new(),
            open: None,
        }
    }

    /// Apply one week starting from `current`; returns the new weight
    fn push(&mut self, current: f64, step: &WeekStep) -> f64 {
        if self.open.as_ref().is_some_and(|open| !open.accepts(step)) {
            self.close_at(current);
        }

        let open = self.open.get_or_insert_with(|| OpenWindow {
            first_week: step.week,
            last_week: step.week,
            block: step.block,
            rate_factor: step.rate_factor,
            start_weight: current,
            peptide_loss: 0.0,
            deficit_loss: 0.0,
        });
        open.last_week = step.week;
        open.peptide_loss += step.peptide_loss;
        open.deficit_loss += step.deficit_loss;

        current - step.total_loss()
    }

    fn close_at(&mut self, end_weight: f64) {
        if let Some(open) = self.open.take() {
            let window = open.into_window(end_weight);
            trace!(
                label = %window.label,
                unit = self.unit_system.weight_label(),
                total_loss = window.total_loss,
                "Closed projection window"
            );
            self.windows.push(window);
        }
    }

    fn finish(mut self, end_weight: f64) -> Vec<ProjectionWindow> {
        self.close_at(end_weight);
        self.windows
    }
}

/// Round to the 0.01 display precision
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
