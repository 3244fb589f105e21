//! Peptide rate and titration tables
//!
//! Two process-wide constant tables drive the projection:
//!
//! - [`BASE_WEEKLY_RATES_LB`]: full-dose weekly loss per peptide, in pounds
//! - [`TITRATION_SCHEDULES`]: dose multipliers, one per 4-week block
//!
//! They are validated into a [`RateTable`] once. The only way to change the
//! table a calculation sees is [`override_base_rate`], which is scoped to the
//! current thread and undone when its guard drops.

use once_cell::sync::Lazy;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::errors::{CalculatorError, ConfigurationError};

/// Weeks per titration block
pub const TITRATION_BLOCK_WEEKS: u32 = 4;

/// Full-dose weekly loss rate per peptide (lb/week)
pub const BASE_WEEKLY_RATES_LB: &[(&str, f64)] = &[
    ("semaglutide", 1.5),
    ("tirzepatide", 2.0),
    ("retatrutide", 2.0),
];

/// Dose multipliers per 4-week block; the last entry holds afterwards
pub const TITRATION_SCHEDULES: &[(&str, &[f64])] = &[
    ("semaglutide", &[0.25, 0.50, 0.70, 0.85, 1.00]),
    ("tirzepatide", &[0.20, 0.40, 0.60, 0.75, 0.90, 1.00]),
    ("retatrutide", &[0.25, 0.50, 0.75, 1.00]),
];

/// Zero-based titration block for a 1-based week (week 0 counts as week 1)
pub fn block_index(week: u32) -> usize {
    (week.max(1) - 1) as usize / TITRATION_BLOCK_WEEKS as usize
}

/// Rate profile of a single peptide
#[derive(Debug, Clone, PartialEq)]
pub struct PeptideProfile {
    pub key: String,
    pub base_weekly_rate_lb: f64,
    pub titration: Vec<f64>,
}

impl PeptideProfile {
    /// Multiplier in effect during `week`, holding the last one past the schedule
    pub fn multiplier_for_week(&self, week: u32) -> f64 {
        let last = self.titration.len().saturating_sub(1);
        self.titration
            .get(block_index(week).min(last))
            .copied()
            .unwrap_or(0.0)
    }

    /// Titrated weekly rate in pounds
    pub fn effective_rate(&self, week: u32) -> f64 {
        self.base_weekly_rate_lb * self.multiplier_for_week(week)
    }

    /// Highest weekly rate the peptide can reach (lb/week)
    pub fn peak_rate(&self, use_ramp: bool) -> f64 {
        if use_ramp {
            let peak = self.titration.iter().copied().fold(0.0, f64::max);
            self.base_weekly_rate_lb * peak
        } else {
            self.base_weekly_rate_lb
        }
    }
}

/// Validated peptide rate table
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    profiles: BTreeMap<String, PeptideProfile>,
}

static BUILTIN: Lazy<Result<RateTable, ConfigurationError>> =
    Lazy::new(|| RateTable::from_tables(BASE_WEEKLY_RATES_LB, TITRATION_SCHEDULES));

impl RateTable {
    /// The built-in table, validated on first use
    pub fn builtin() -> Result<&'static RateTable, ConfigurationError> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    /// Build a table from a rate table and a titration table.
    ///
    /// Both tables must name the same peptides, every rate must be positive
    /// and every schedule non-empty with non-negative multipliers.
    pub fn from_tables(
        rates: &[(&str, f64)],
        titration: &[(&str, &[f64])],
    ) -> Result<Self, ConfigurationError> {
        let mut rate_map = BTreeMap::new();
        for &(key, rate) in rates {
            if rate_map.insert(normalize_key(key), rate).is_some() {
                return Err(ConfigurationError::DuplicatePeptide(key.to_string()));
            }
        }

        let mut titration_map = BTreeMap::new();
        for &(key, schedule) in titration {
            if titration_map.insert(normalize_key(key), schedule).is_some() {
                return Err(ConfigurationError::DuplicatePeptide(key.to_string()));
            }
        }

        let rate_keys: BTreeSet<&String> = rate_map.keys().collect();
        let titration_keys: BTreeSet<&String> = titration_map.keys().collect();
        if rate_keys != titration_keys {
            return Err(ConfigurationError::MismatchedKeys {
                missing_titration: rate_keys
                    .difference(&titration_keys)
                    .map(|k| k.to_string())
                    .collect(),
                missing_rate: titration_keys
                    .difference(&rate_keys)
                    .map(|k| k.to_string())
                    .collect(),
            });
        }

        let mut profiles = BTreeMap::new();
        for (key, rate) in rate_map {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ConfigurationError::NonPositiveRate { peptide: key, rate });
            }

            let schedule = titration_map.get(&key).copied().unwrap_or_default();
            if schedule.is_empty() {
                return Err(ConfigurationError::EmptyTitration(key));
            }
            if let Some((index, &value)) = schedule
                .iter()
                .enumerate()
                .find(|(_, m)| !m.is_finite() || **m < 0.0)
            {
                return Err(ConfigurationError::InvalidMultiplier {
                    peptide: key,
                    index,
                    value,
                });
            }

            profiles.insert(
                key.clone(),
                PeptideProfile {
                    key,
                    base_weekly_rate_lb: rate,
                    titration: schedule.to_vec(),
                },
            );
        }

        Ok(Self { profiles })
    }

    /// Look up a peptide (case-insensitive)
    pub fn profile(&self, peptide: &str) -> Result<&PeptideProfile, CalculatorError> {
        self.profiles
            .get(&normalize_key(peptide))
            .ok_or_else(|| CalculatorError::UnknownPeptide(peptide.trim().to_string()))
    }

    /// `R[peptide] × TITRATION[peptide][block(week)]`, in lb/week
    pub fn effective_rate(&self, peptide: &str, week: u32) -> Result<f64, CalculatorError> {
        Ok(self.profile(peptide)?.effective_rate(week))
    }

    /// Known peptide keys, sorted
    pub fn peptides(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &PeptideProfile> {
        self.profiles.values()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

// ============================================================================
// Active Table and Scoped Overrides
// ============================================================================

thread_local! {
    static OVERRIDES: RefCell<Vec<ActiveOverride>> = const { RefCell::new(Vec::new()) };
    static NEXT_OVERRIDE_ID: Cell<u64> = const { Cell::new(0) };
}

/// One installed override; the last entry is the table in effect
struct ActiveOverride {
    id: u64,
    table: Rc<RateTable>,
}

/// Run `f` against the table in effect on this thread.
///
/// The override stack is not borrowed while `f` runs, so `f` may install
/// or drop overrides itself.
pub fn with_active_table<T>(
    f: impl FnOnce(&RateTable) -> Result<T, CalculatorError>,
) -> Result<T, CalculatorError> {
    let active = OVERRIDES.with(|stack| stack.borrow().last().map(|o| Rc::clone(&o.table)));
    match active {
        Some(table) => f(&table),
        None => f(RateTable::builtin()?),
    }
}

/// Titrated weekly rate (lb/week) from the active table
pub fn effective_rate(peptide: &str, week: u32) -> Result<f64, CalculatorError> {
    with_active_table(|table| table.effective_rate(peptide, week))
}

/// Removes its override when dropped.
///
/// Dropping a guard also removes every override installed after it, so the
/// thread is back to exactly the table that was active before this guard
/// was created, whatever order guards are dropped in.
#[must_use = "the override is undone as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RateOverrideGuard {
    id: u64,
    // Overrides are per thread; the guard must be dropped where it was made.
    _not_send: PhantomData<*const ()>,
}

impl Drop for RateOverrideGuard {
    fn drop(&mut self) {
        OVERRIDES.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().position(|o| o.id == self.id) {
                stack.truncate(pos);
            }
        });
    }
}

/// Replace one peptide's base rate for the current thread.
///
/// Zero is accepted here (unlike in the constant tables) so degenerate
/// inputs can be exercised. Guards nest; each override starts from the
/// table active when it is installed.
pub fn override_base_rate(peptide: &str, rate: f64) -> Result<RateOverrideGuard, CalculatorError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(ConfigurationError::InvalidOverride {
            peptide: peptide.to_string(),
            rate,
        }
        .into());
    }

    let mut table = with_active_table(|table| Ok(table.clone()))?;
    let key = normalize_key(peptide);
    match table.profiles.get_mut(&key) {
        Some(profile) => profile.base_weekly_rate_lb = rate,
        None => return Err(CalculatorError::UnknownPeptide(peptide.trim().to_string())),
    }

    let id = NEXT_OVERRIDE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    OVERRIDES.with(|stack| {
        stack.borrow_mut().push(ActiveOverride {
            id,
            table: Rc::new(table),
        })
    });

    Ok(RateOverrideGuard {
        id,
        _not_send: PhantomData,
    })
}
