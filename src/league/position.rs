// Recognized lineup positions and their wire abbreviations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fantasy-football lineup positions recognized by the league.
///
/// Anything outside these six values is rejected at the ingestion boundary
/// and never reaches the analytics core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DEF")]
    Defense,
}

/// All recognized positions, in canonical display order.
pub const ALL_POSITIONS: &[Position] = &[
    Position::Quarterback,
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
    Position::Kicker,
    Position::Defense,
];

impl Position {
    /// Parse a position abbreviation into a Position enum.
    ///
    /// Handles the Sleeper-style abbreviations used in the weekly record
    /// files ("QB", "RB", "WR", "TE", "K", "DEF"/"DST"). Returns `None`
    /// for anything unrecognized.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DEF" | "DST" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}
