// ffWAR aggregator.
//
// Folds per-game simulation deltas into running totals keyed by player and
// by (player, manager). The fold is associative and commutative over the
// slots in scope, so partial accumulators (e.g. one per week) can be merged
// in any order with identical results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::league::facts::{LeagueFacts, RosterSlot};
use crate::league::position::Position;

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One aggregated output record, at either the player grain or the
/// (player, manager) grain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarRecord {
    /// Player display name.
    pub key: String,
    pub player_id: String,
    /// Present only at the (player, manager) grain.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub manager: Option<String>,
    pub position: Position,
    pub total_points: f64,
    pub num_games_started: u32,
    #[serde(rename = "ffWAR")]
    pub ffwar: f64,
    /// Playoff placements (year -> place) for the record's manager, only on
    /// manager-scoped records and only for years inside the query scope.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub playoff_placements: BTreeMap<u16, u8>,
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct SlotTotals {
    display_name: String,
    position: Position,
    total_points: f64,
    games_started: u32,
    ffwar: f64,
}

impl SlotTotals {
    fn zero(slot: &RosterSlot) -> Self {
        SlotTotals {
            display_name: slot.display_name.clone(),
            position: slot.position,
            total_points: 0.0,
            games_started: 0,
            ffwar: 0.0,
        }
    }

    fn absorb(&mut self, other: &SlotTotals) {
        self.total_points += other.total_points;
        self.games_started += other.games_started;
        self.ffwar += other.ffwar;
    }
}

/// Running ffWAR totals, keyed internally at the finest grain
/// (player, manager) so either output grain can be produced by collapsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    totals: BTreeMap<(String, String), SlotTotals>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rostered occurrence without starting it. Creates the
    /// zero record if absent; rostered-but-never-started players report
    /// all-zero totals rather than being an error.
    pub fn record_rostered(&mut self, slot: &RosterSlot, manager: &str) {
        self.totals
            .entry((slot.player_id.clone(), manager.to_string()))
            .or_insert_with(|| SlotTotals::zero(slot));
    }

    /// Fold one started slot's contribution: its points, one game started,
    /// and its simulated ffWAR delta (absent when the position's baseline
    /// was unavailable — points and games still count).
    pub fn record_started(&mut self, slot: &RosterSlot, manager: &str, delta: Option<f64>) {
        let entry = self
            .totals
            .entry((slot.player_id.clone(), manager.to_string()))
            .or_insert_with(|| SlotTotals::zero(slot));
        entry.total_points += slot.points;
        entry.games_started += 1;
        if let Some(delta) = delta {
            entry.ffwar += delta;
        }
    }

    /// Associative, commutative combine of two partial accumulators.
    pub fn merge(mut self, other: Accumulator) -> Accumulator {
        for (key, totals) in other.totals {
            match self.totals.get_mut(&key) {
                Some(existing) => existing.absorb(&totals),
                None => {
                    self.totals.insert(key, totals);
                }
            }
        }
        self
    }

    /// Whether anything has been recorded.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Collapse to the player grain: one record per player across all of
    /// their managers in scope.
    pub fn into_player_records(self) -> Vec<WarRecord> {
        let mut by_player: BTreeMap<String, SlotTotals> = BTreeMap::new();
        for ((player_id, _manager), totals) in self.totals {
            match by_player.get_mut(&player_id) {
                Some(existing) => existing.absorb(&totals),
                None => {
                    by_player.insert(player_id, totals);
                }
            }
        }

        by_player
            .into_iter()
            .map(|(player_id, totals)| finish_record(player_id, None, totals, BTreeMap::new()))
            .collect()
    }

    /// Produce (player, manager)-grain records, annotated with the
    /// manager's playoff placements for the years in scope.
    pub fn into_manager_records(self, facts: &LeagueFacts, years: &[u16]) -> Vec<WarRecord> {
        self.totals
            .into_iter()
            .map(|((player_id, manager), totals)| {
                let placements = facts.placements_for(&manager, years);
                finish_record(player_id, Some(manager), totals, placements)
            })
            .collect()
    }
}

/// Build the final record, rounding totals to 2 decimals and ffWAR to 3.
/// Rounding happens only here, after all folding, so partial-merge order
/// can never change the result.
fn finish_record(
    player_id: String,
    manager: Option<String>,
    totals: SlotTotals,
    playoff_placements: BTreeMap<u16, u8>,
) -> WarRecord {
    WarRecord {
        key: totals.display_name,
        player_id,
        manager,
        position: totals.position,
        total_points: round_to(totals.total_points, 2),
        num_games_started: totals.games_started,
        ffwar: round_to(totals.ffwar, 3),
        playoff_placements,
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
