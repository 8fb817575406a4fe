// Scopes and query filters.
//
// A `Scope` pins down which weekly facts feed a computation; a
// `QueryFilter` is the caller-facing filter set that the query layer
// resolves to a scope. The filter also produces the deterministic cache
// key, so identical filter sets always hit the same cache entry.

use serde::{Deserialize, Serialize};

use crate::league::facts::LeagueFacts;
use crate::league::position::Position;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A concrete fact scope: the whole history, one season, or one week.
///
/// Replacement baselines are keyed by season or week scopes only; the
/// full-history variant exists for query resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    FullHistory,
    Season(u16),
    Week(u16, u8),
}

impl Scope {
    /// Whether a (season, week) pair falls inside this scope.
    pub fn contains(&self, season: u16, week: u8) -> bool {
        match *self {
            Scope::FullHistory => true,
            Scope::Season(y) => y == season,
            Scope::Week(y, w) => y == season && w == week,
        }
    }
}

// ---------------------------------------------------------------------------
// Query filter
// ---------------------------------------------------------------------------

/// The filter set accepted by the scope query layer.
///
/// All fields optional; no filters means the full-history scope. These are
/// explicit parameters threaded through every call, never ambient state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub season: Option<u16>,
    pub week: Option<u8>,
    pub manager: Option<String>,
    pub position: Option<Position>,
}

impl QueryFilter {
    /// Resolve the season/week part of the filter to a concrete fact scope.
    /// A week without a season is rejected upstream (see `cli`), so here a
    /// lone week falls back to the season-less full history.
    pub fn scope(&self) -> Scope {
        match (self.season, self.week) {
            (Some(y), Some(w)) => Scope::Week(y, w),
            (Some(y), None) => Scope::Season(y),
            _ => Scope::FullHistory,
        }
    }

    /// Deterministic cache key encoding the whole filter set. Fields appear
    /// in a fixed order with `*` for absent values.
    ///
    /// The replacement knobs (pool convention, tie value) are not part of
    /// the key. After changing them in league.toml, run with `--refresh`
    /// or delete the cache database; entries written under the old
    /// convention are otherwise served as-is.
    pub fn scope_key(&self) -> String {
        let season = self
            .season
            .map(|y| y.to_string())
            .unwrap_or_else(|| "*".to_string());
        let week = self
            .week
            .map(|w| w.to_string())
            .unwrap_or_else(|| "*".to_string());
        let manager = self.manager.as_deref().unwrap_or("*");
        let position = self
            .position
            .map(|p| p.display_str())
            .unwrap_or("*");
        format!("season={season}|week={week}|manager={manager}|position={position}")
    }

    /// The weeks of `facts` selected by this filter, in (season, week) order.
    pub fn select_weeks<'a>(
        &self,
        facts: &'a LeagueFacts,
    ) -> Vec<&'a crate::league::facts::Week> {
        let scope = self.scope();
        facts
            .weeks()
            .filter(|w| scope.contains(w.season, w.number))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Valid filter options
// ---------------------------------------------------------------------------

/// The selectable seasons, weeks, and managers for building filters.
/// Omitting a category in a query means ALL of that category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidOptions {
    pub seasons: Vec<u16>,
    pub weeks: Vec<u8>,
    pub managers: Vec<String>,
}
