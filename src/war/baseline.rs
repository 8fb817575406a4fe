// Replacement baseline calculator.
//
// For a given scope and position, computes the score a hypothetical
// replacement-level player would have produced: the arithmetic mean of the
// candidate pool's points. The pool convention (all rostered occurrences
// vs. starters only) is deliberately configurable — the domain owner has
// not pinned it down, so it is a parameter rather than a constant.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::league::facts::{LeagueFacts, RosterSlot, Week};
use crate::league::position::{Position, ALL_POSITIONS};
use crate::war::scope::Scope;

// ---------------------------------------------------------------------------
// Pool convention
// ---------------------------------------------------------------------------

/// Which rostered occurrences form the replacement-level candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacementPool {
    /// Every rostered occurrence at the position, started or benched.
    /// Represents "a typical rostered player" and is the default.
    AllRostered,
    /// Started occurrences only.
    StartersOnly,
}

impl Default for ReplacementPool {
    fn default() -> Self {
        ReplacementPool::AllRostered
    }
}

impl ReplacementPool {
    fn admits(&self, slot: &RosterSlot) -> bool {
        match self {
            ReplacementPool::AllRostered => true,
            ReplacementPool::StartersOnly => slot.started,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The candidate pool for a (scope, position) pair was empty. Callers must
/// decide a fallback; defaulting to zero would bias ffWAR upward for every
/// player at the position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no rostered {position} occurrences in {scope:?}")]
pub struct NoBaselineData {
    pub scope: Scope,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Single-scope contract
// ---------------------------------------------------------------------------

/// Compute the replacement baseline for one (scope, position) pair.
///
/// The scope must be a season or a (season, week) pair; the full-history
/// scope has no baseline of its own because replacement level is a
/// per-season notion at its widest.
pub fn baseline(
    facts: &LeagueFacts,
    scope: Scope,
    position: Position,
    pool: ReplacementPool,
) -> Result<f64, NoBaselineData> {
    let points: Vec<f64> = facts
        .weeks()
        .filter(|w| scope.contains(w.season, w.number))
        .flat_map(|w| w.slots())
        .filter(|s| s.position == position && pool.admits(s))
        .map(|s| s.points)
        .collect();

    if points.is_empty() {
        return Err(NoBaselineData { scope, position });
    }
    Ok(points.iter().sum::<f64>() / points.len() as f64)
}

// ---------------------------------------------------------------------------
// Memoized per-week baseline set
// ---------------------------------------------------------------------------

/// Baselines for every (week, position) pair in a selection of weeks,
/// computed once up front. Simulation for a scope only starts after its
/// baselines are fully computed, so this is the ordering point.
///
/// The pipeline always works at week granularity: a season aggregate is the
/// fold of its weeks, which keeps aggregation associative regardless of how
/// a query slices the history.
#[derive(Debug, Clone)]
pub struct BaselineSet {
    values: HashMap<(u16, u8, Position), f64>,
    missing: BTreeSet<(u16, u8, Position)>,
}

impl BaselineSet {
    /// Compute baselines for all six positions across the given weeks.
    /// Positions with an empty pool in a week are recorded as missing, not
    /// silently defaulted.
    pub fn compute(weeks: &[&Week], pool: ReplacementPool) -> Self {
        let mut values = HashMap::new();
        let mut missing = BTreeSet::new();

        for week in weeks {
            for &position in ALL_POSITIONS {
                let points: Vec<f64> = week
                    .slots()
                    .filter(|s| s.position == position && pool.admits(s))
                    .map(|s| s.points)
                    .collect();

                let key = (week.season, week.number, position);
                if points.is_empty() {
                    missing.insert(key);
                } else {
                    values.insert(key, points.iter().sum::<f64>() / points.len() as f64);
                }
            }
        }

        BaselineSet { values, missing }
    }

    /// The memoized baseline for one week and position, if its pool was
    /// non-empty.
    pub fn get(&self, season: u16, week: u8, position: Position) -> Option<f64> {
        self.values.get(&(season, week, position)).copied()
    }

    /// The (season, week, position) triples that had no pool data, in
    /// deterministic order.
    pub fn missing(&self) -> impl Iterator<Item = &(u16, u8, Position)> {
        self.missing.iter()
    }
}
