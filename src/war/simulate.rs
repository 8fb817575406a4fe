// Matchup simulator.
//
// Replays one started slot's matchup with the player's score swapped for
// the replacement baseline and records whether the outcome changes. Pure
// over the matchup facts and the baseline value: no mutation, fully
// deterministic.

use serde::{Deserialize, Serialize};

use crate::league::facts::{RosterSlot, RosterSnapshot};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// The result of one matchup side, derived from the two totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    /// Derive the outcome for the side with total `own` against `opponent`.
    pub fn from_totals(own: f64, opponent: f64) -> Self {
        if own > opponent {
            Outcome::Win
        } else if own < opponent {
            Outcome::Loss
        } else {
            Outcome::Tie
        }
    }

    /// Win-value of the outcome: WIN -> 1.0, LOSS -> 0.0, TIE -> the
    /// configured tie value (0.5 under the standard convention).
    pub fn value(&self, tie_value: f64) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Tie => tie_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The actual and counterfactual outcomes for one started slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    pub actual: Outcome,
    pub counterfactual: Outcome,
}

impl Simulation {
    /// The per-game ffWAR delta: value(actual) - value(counterfactual).
    /// With the standard 0.5 tie value the delta always lies in
    /// {-1.0, -0.5, 0.0, 0.5, 1.0}.
    pub fn war_delta(&self, tie_value: f64) -> f64 {
        self.actual.value(tie_value) - self.counterfactual.value(tie_value)
    }
}

/// Simulate one started slot within its matchup.
///
/// `own` must be the snapshot containing `slot`; `opponent` is the other
/// side. Only the slot's own side is perturbed: its total loses the slot's
/// points and gains the replacement baseline, while the opponent's total
/// is untouched.
pub fn simulate(
    slot: &RosterSlot,
    own: &RosterSnapshot,
    opponent: &RosterSnapshot,
    baseline: f64,
) -> Simulation {
    let own_total = own.total_points();
    let opponent_total = opponent.total_points();

    let actual = Outcome::from_totals(own_total, opponent_total);
    let counterfactual_total = own_total - slot.points + baseline;
    let counterfactual = Outcome::from_totals(counterfactual_total, opponent_total);

    Simulation {
        actual,
        counterfactual,
    }
}
