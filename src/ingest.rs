// Weekly fact ingestion.
//
// Reads the per-season week files and the placements file from the data
// directory and normalizes them into `LeagueFacts`. Unreadable or
// unparseable files are fatal; semantically bad weeks (unknown positions,
// matchups without exactly two sides) are excluded from the facts and
// reported, so one corrupt week never silently skews league-wide numbers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::league::facts::{LeagueFacts, Matchup, RosterSlot, RosterSnapshot, SeasonFacts, Week};
use crate::league::position::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("placement for {manager} in {year} is {place}, expected 1 through 3")]
    InvalidPlacement {
        year: u16,
        manager: String,
        place: u8,
    },
}

/// Why a week was excluded from the facts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekIssue {
    #[error("unknown position `{position}` for player {player}")]
    UnknownPosition { player: String, position: String },

    #[error("matchup with {sides} sides, expected exactly 2")]
    UnpairedMatchup { sides: usize },

    #[error("manager {manager} appears in more than one matchup")]
    ManagerInMultipleMatchups { manager: String },
}

/// A week excluded during ingestion, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedWeek {
    pub season: u16,
    pub week: u8,
    pub issue: WeekIssue,
}

/// Everything ingestion wants to tell the caller beyond the facts
/// themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub excluded_weeks: Vec<ExcludedWeek>,
    /// Set when a season is configured for the current calendar year but
    /// no week data for it was found.
    pub missing_current_season: Option<u16>,
}

// ---------------------------------------------------------------------------
// Raw file structs
// ---------------------------------------------------------------------------

// Field aliases absorb the naming drift across fetcher versions; older
// dumps say `pts`/`pos`/`full_name` where newer ones spell it out.

#[derive(Debug, Deserialize)]
struct RawWeekFile {
    season: u16,
    week: u8,
    matchups: Vec<RawMatchup>,
}

#[derive(Debug, Deserialize)]
struct RawMatchup {
    sides: Vec<RawSide>,
}

#[derive(Debug, Deserialize)]
struct RawSide {
    manager: String,
    #[serde(alias = "players", alias = "roster")]
    slots: Vec<RawSlot>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    #[serde(alias = "id")]
    player_id: String,
    #[serde(alias = "name", alias = "full_name")]
    display_name: String,
    #[serde(alias = "pos")]
    position: String,
    #[serde(alias = "points_scored", alias = "pts")]
    points: f64,
    #[serde(default = "default_started")]
    started: bool,
}

fn default_started() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load all configured seasons from `data_dir` into normalized facts.
///
/// Week files live at `<data_dir>/<year>/week_<n>.json`; placements at
/// `<data_dir>/placements.json`. Seasons without a data directory are
/// skipped (not yet fetched), as are week files beyond the season's
/// regular-season cap.
pub fn load_facts(data_dir: &Path, config: &Config) -> Result<(LeagueFacts, IngestReport), IngestError> {
    let mut report = IngestReport::default();
    let mut seasons = Vec::new();

    for &year in config.league.league_ids.keys() {
        let season_dir = data_dir.join(year.to_string());
        if !season_dir.is_dir() {
            debug!(year, "no data directory for season, skipping");
            continue;
        }

        let cap = config.league.weeks_in_season(year);
        let mut weeks = Vec::new();
        for number in 1..=cap {
            let path = season_dir.join(format!("week_{number:02}.json"));
            if !path.is_file() {
                continue;
            }
            if let Some(week) = load_week(&path, year, number, config, &mut report)? {
                weeks.push(week);
            }
        }

        if !weeks.is_empty() {
            seasons.push(SeasonFacts { year, weeks });
        }
    }

    report.missing_current_season = config
        .league
        .current_season()
        .filter(|&year| !seasons.iter().any(|s| s.year == year));

    let placements = load_placements(data_dir, config)?;

    Ok((LeagueFacts { seasons, placements }, report))
}

/// Load one week file; `Ok(None)` means the week was excluded and reported.
fn load_week(
    path: &Path,
    year: u16,
    number: u8,
    config: &Config,
    report: &mut IngestReport,
) -> Result<Option<Week>, IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawWeekFile = serde_json::from_str(&text).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // The path decides season and week; mismatched file headers are noise
    // from manual edits and only warrant a warning.
    if raw.season != year || raw.week != number {
        warn!(
            path = %path.display(),
            file_season = raw.season,
            file_week = raw.week,
            "week file header disagrees with its path"
        );
    }

    match normalize_week(raw, year, number, config) {
        Ok(week) => Ok(Some(week)),
        Err(issue) => {
            warn!(year, week = number, %issue, "excluding week from facts");
            report.excluded_weeks.push(ExcludedWeek {
                season: year,
                week: number,
                issue,
            });
            Ok(None)
        }
    }
}

fn normalize_week(
    raw: RawWeekFile,
    season: u16,
    number: u8,
    config: &Config,
) -> Result<Week, WeekIssue> {
    let mut matchups = Vec::with_capacity(raw.matchups.len());

    for matchup in raw.matchups {
        let [a, b]: [RawSide; 2] = matchup
            .sides
            .try_into()
            .map_err(|sides: Vec<RawSide>| WeekIssue::UnpairedMatchup { sides: sides.len() })?;
        matchups.push(Matchup {
            sides: [normalize_side(a, config)?, normalize_side(b, config)?],
        });
    }

    let week = Week {
        season,
        number,
        matchups,
    };

    // Pairing invariant: every manager sits in exactly one matchup per
    // week. A duplicate would double-count that manager's slots in
    // baselines, totals, and ffWAR.
    {
        let mut seen = BTreeSet::new();
        for manager in week.managers() {
            if !seen.insert(manager) {
                return Err(WeekIssue::ManagerInMultipleMatchups {
                    manager: manager.to_string(),
                });
            }
        }
    }

    Ok(week)
}

fn normalize_side(raw: RawSide, config: &Config) -> Result<RosterSnapshot, WeekIssue> {
    let manager = config.league.display_name(&raw.manager).to_string();
    let mut slots = Vec::with_capacity(raw.slots.len());
    for slot in raw.slots {
        let position =
            Position::from_str_pos(&slot.position).ok_or_else(|| WeekIssue::UnknownPosition {
                player: slot.display_name.clone(),
                position: slot.position.clone(),
            })?;
        slots.push(RosterSlot {
            player_id: slot.player_id,
            display_name: slot.display_name,
            position,
            points: slot.points,
            started: slot.started,
        });
    }
    Ok(RosterSnapshot { manager, slots })
}

// ---------------------------------------------------------------------------
// Placements
// ---------------------------------------------------------------------------

fn load_placements(
    data_dir: &Path,
    config: &Config,
) -> Result<BTreeMap<u16, BTreeMap<String, u8>>, IngestError> {
    let path = data_dir.join("placements.json");
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }

    let text = std::fs::read_to_string(&path).map_err(|source| IngestError::Io {
        path: path.clone(),
        source,
    })?;
    let raw: BTreeMap<u16, BTreeMap<String, u8>> =
        serde_json::from_str(&text).map_err(|source| IngestError::Parse {
            path: path.clone(),
            source,
        })?;

    let mut placements = BTreeMap::new();
    for (year, by_manager) in raw {
        let mut mapped = BTreeMap::new();
        for (username, place) in by_manager {
            if !(1..=3).contains(&place) {
                return Err(IngestError::InvalidPlacement {
                    year,
                    manager: username,
                    place,
                });
            }
            mapped.insert(config.league.display_name(&username).to_string(), place);
        }
        placements.insert(year, mapped);
    }
    Ok(placements)
}
