// Immutable weekly roster/score facts derived from ingested data.
//
// Everything in this module is a plain fact: once a refresh cycle has built
// a `LeagueFacts`, nothing downstream mutates it. Baselines and ffWAR
// records are derived values and are always recomputable from these facts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::league::position::Position;

// ---------------------------------------------------------------------------
// Roster slots and snapshots
// ---------------------------------------------------------------------------

/// One rostered player occurrence for one manager in one week.
///
/// Bench entries are carried (they feed the all-rostered replacement pool
/// and zero-record reporting) but only started slots count toward team
/// totals, `games_started`, and ffWAR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub player_id: String,
    pub display_name: String,
    pub position: Position,
    pub points: f64,
    pub started: bool,
}

/// The full roster one manager fielded in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub manager: String,
    pub slots: Vec<RosterSlot>,
}

impl RosterSnapshot {
    /// Iterate over the started slots only.
    pub fn starters(&self) -> impl Iterator<Item = &RosterSlot> {
        self.slots.iter().filter(|s| s.started)
    }

    /// Realized team total: the sum of started slots' points.
    pub fn total_points(&self) -> f64 {
        self.starters().map(|s| s.points).sum()
    }
}

// ---------------------------------------------------------------------------
// Matchups and weeks
// ---------------------------------------------------------------------------

/// An unordered pair of opposing rosters for one week.
///
/// The outcome is always derived from the two realized totals; it is never
/// stored independently, so there is no stale-winner state to invalidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub sides: [RosterSnapshot; 2],
}

/// One regular-season week of matchups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub season: u16,
    pub number: u8,
    pub matchups: Vec<Matchup>,
}

impl Week {
    /// Iterate over every roster snapshot in the week, across all matchups.
    pub fn snapshots(&self) -> impl Iterator<Item = &RosterSnapshot> {
        self.matchups.iter().flat_map(|m| m.sides.iter())
    }

    /// Iterate over every roster slot in the week (started and bench).
    pub fn slots(&self) -> impl Iterator<Item = &RosterSlot> {
        self.snapshots().flat_map(|snap| snap.slots.iter())
    }

    /// All managers active in this week, in matchup order.
    pub fn managers(&self) -> Vec<&str> {
        self.snapshots().map(|snap| snap.manager.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Seasons and the whole league history
// ---------------------------------------------------------------------------

/// The regular-season weeks of one season, ordered by week number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonFacts {
    pub year: u16,
    pub weeks: Vec<Week>,
}

/// Everything the analytics pipeline knows: the full ingested history plus
/// playoff-placement facts (which annotate manager-scoped output but never
/// feed ffWAR itself).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueFacts {
    /// Seasons ordered by year.
    pub seasons: Vec<SeasonFacts>,
    /// season -> manager -> playoff place (1, 2, or 3).
    pub placements: BTreeMap<u16, BTreeMap<String, u8>>,
}

impl LeagueFacts {
    /// Look up one season's facts.
    pub fn season(&self, year: u16) -> Option<&SeasonFacts> {
        self.seasons.iter().find(|s| s.year == year)
    }

    /// Iterate over every week in the history, season by season.
    pub fn weeks(&self) -> impl Iterator<Item = &Week> {
        self.seasons.iter().flat_map(|s| s.weeks.iter())
    }

    /// The years with any ingested data, ascending.
    pub fn years(&self) -> Vec<u16> {
        self.seasons.iter().map(|s| s.year).collect()
    }

    /// Every manager that appears anywhere in the history, sorted.
    pub fn managers(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .weeks()
            .flat_map(|w| w.snapshots())
            .map(|snap| snap.manager.as_str())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Playoff placements for one manager restricted to the given years:
    /// year -> place. Empty when the manager never placed.
    pub fn placements_for(&self, manager: &str, years: &[u16]) -> BTreeMap<u16, u8> {
        let mut out = BTreeMap::new();
        for (&year, by_manager) in &self.placements {
            if !years.contains(&year) {
                continue;
            }
            if let Some(&place) = by_manager.get(manager) {
                out.insert(year, place);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, pos: Position, points: f64, started: bool) -> RosterSlot {
        RosterSlot {
            player_id: id.to_string(),
            display_name: format!("Player {id}"),
            position: pos,
            points,
            started,
        }
    }

    fn snapshot(manager: &str, slots: Vec<RosterSlot>) -> RosterSnapshot {
        RosterSnapshot {
            manager: manager.to_string(),
            slots,
        }
    }

    #[test]
    fn total_points_counts_starters_only() {
        let snap = snapshot(
            "Jack",
            vec![
                slot("1", Position::Quarterback, 20.0, true),
                slot("2", Position::RunningBack, 10.5, true),
                slot("3", Position::RunningBack, 30.0, false), // benched
            ],
        );
        assert!((snap.total_points() - 30.5).abs() < 1e-9);
    }

    #[test]
    fn starters_excludes_bench() {
        let snap = snapshot(
            "Jack",
            vec![
                slot("1", Position::Quarterback, 20.0, true),
                slot("2", Position::Kicker, 8.0, false),
            ],
        );
        let started: Vec<_> = snap.starters().collect();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].player_id, "1");
    }

    #[test]
    fn week_managers_keeps_duplicates_in_matchup_order() {
        let week = Week {
            season: 2021,
            number: 1,
            matchups: vec![
                Matchup {
                    sides: [snapshot("Jack", vec![]), snapshot("Sam", vec![])],
                },
                Matchup {
                    sides: [snapshot("Jack", vec![]), snapshot("Tommy", vec![])],
                },
            ],
        };
        // Duplicates survive so the ingestion boundary can spot a manager
        // sitting in two matchups.
        assert_eq!(week.managers(), vec!["Jack", "Sam", "Jack", "Tommy"]);
    }

    #[test]
    fn managers_sorted_and_deduplicated() {
        let facts = LeagueFacts {
            seasons: vec![SeasonFacts {
                year: 2021,
                weeks: vec![
                    Week {
                        season: 2021,
                        number: 1,
                        matchups: vec![Matchup {
                            sides: [snapshot("Sam", vec![]), snapshot("Jack", vec![])],
                        }],
                    },
                    Week {
                        season: 2021,
                        number: 2,
                        matchups: vec![Matchup {
                            sides: [snapshot("Jack", vec![]), snapshot("Sam", vec![])],
                        }],
                    },
                ],
            }],
            placements: BTreeMap::new(),
        };
        assert_eq!(facts.managers(), vec!["Jack".to_string(), "Sam".to_string()]);
    }

    #[test]
    fn placements_for_restricts_to_years() {
        let mut placements = BTreeMap::new();
        placements.insert(2021, BTreeMap::from([("Jack".to_string(), 1u8)]));
        placements.insert(2022, BTreeMap::from([("Jack".to_string(), 3u8)]));
        let facts = LeagueFacts {
            seasons: vec![],
            placements,
        };

        let in_scope = facts.placements_for("Jack", &[2021]);
        assert_eq!(in_scope, BTreeMap::from([(2021, 1)]));

        let both = facts.placements_for("Jack", &[2021, 2022]);
        assert_eq!(both.len(), 2);

        assert!(facts.placements_for("Sam", &[2021, 2022]).is_empty());
    }
}
