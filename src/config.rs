// Configuration loading and parsing (config/league.toml).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::Deserialize;
use thiserror::Error;

use crate::war::baseline::ReplacementPool;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// league.toml file structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire league.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
    #[serde(default)]
    replacement: ReplacementConfig,
    #[serde(default)]
    storage: StorageSection,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    name: String,
    platform: String,
    #[serde(default = "default_regular_season_weeks")]
    regular_season_weeks: u8,
    /// year -> upstream league id. TOML table keys are strings; parsed to
    /// numeric years during assembly.
    league_ids: BTreeMap<String, String>,
    /// Seasons whose regular season was shorter than the default (13 weeks
    /// in 2019 and 2020).
    #[serde(default)]
    week_overrides: BTreeMap<String, u8>,
    /// Upstream username -> display name.
    #[serde(default)]
    managers: BTreeMap<String, String>,
}

fn default_regular_season_weeks() -> u8 {
    14
}

#[derive(Debug, Clone, Deserialize)]
struct StorageSection {
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_cache_db")]
    cache_db: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        StorageSection {
            data_dir: default_data_dir(),
            cache_db: default_cache_db(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_cache_db() -> String {
    "patriot-center.db".to_string()
}

/// Replacement algorithm knobs. Both the pool convention and the tie value
/// are still open with the league, so they are configuration rather than
/// constants.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReplacementConfig {
    #[serde(default)]
    pub pool: ReplacementPool,
    #[serde(default = "default_tie_value")]
    pub tie_value: f64,
}

fn default_tie_value() -> f64 {
    0.5
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        ReplacementConfig {
            pool: ReplacementPool::default(),
            tie_value: default_tie_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assembled public Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub replacement: ReplacementConfig,
    pub data_dir: String,
    pub cache_db: String,
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub name: String,
    pub platform: String,
    pub regular_season_weeks: u8,
    pub league_ids: BTreeMap<u16, String>,
    pub week_overrides: BTreeMap<u16, u8>,
    pub managers: BTreeMap<String, String>,
}

impl LeagueConfig {
    /// Regular-season week count for a season, honoring per-season overrides.
    pub fn weeks_in_season(&self, year: u16) -> u8 {
        self.week_overrides
            .get(&year)
            .copied()
            .unwrap_or(self.regular_season_weeks)
    }

    /// Display name for an upstream username; unmapped usernames pass
    /// through unchanged.
    pub fn display_name<'a>(&'a self, username: &'a str) -> &'a str {
        self.managers
            .get(username)
            .map(String::as_str)
            .unwrap_or(username)
    }

    /// The configured season matching the current calendar year, if any.
    pub fn current_season(&self) -> Option<u16> {
        let year = u16::try_from(chrono::Local::now().year()).ok()?;
        self.league_ids.contains_key(&year).then_some(year)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` under
/// `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let league_path = base_dir.join("config").join("league.toml");
    let league_text =
        std::fs::read_to_string(&league_path).map_err(|_| ConfigError::FileNotFound {
            path: league_path.clone(),
        })?;
    let file: LeagueFile = toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
        path: league_path.clone(),
        source: e,
    })?;

    let league = LeagueConfig {
        name: file.league.name,
        platform: file.league.platform,
        regular_season_weeks: file.league.regular_season_weeks,
        league_ids: parse_year_keys(file.league.league_ids, "league.league_ids")?,
        week_overrides: parse_year_keys(file.league.week_overrides, "league.week_overrides")?,
        managers: file.league.managers,
    };

    let config = Config {
        league,
        replacement: file.replacement,
        data_dir: file.storage.data_dir,
        cache_db: file.storage.cache_db,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

fn parse_year_keys<V>(
    raw: BTreeMap<String, V>,
    field: &str,
) -> Result<BTreeMap<u16, V>, ConfigError> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let year: u16 = key.parse().map_err(|_| ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("key `{key}` is not a year"),
        })?;
        out.insert(year, value);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.league_ids.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.league_ids".into(),
            message: "at least one season must be configured".into(),
        });
    }

    let weeks = config.league.regular_season_weeks;
    if weeks == 0 || weeks > 18 {
        return Err(ConfigError::ValidationError {
            field: "league.regular_season_weeks".into(),
            message: format!("must be between 1 and 18, got {weeks}"),
        });
    }

    for (&year, &override_weeks) in &config.league.week_overrides {
        if !config.league.league_ids.contains_key(&year) {
            return Err(ConfigError::ValidationError {
                field: "league.week_overrides".into(),
                message: format!("override for unconfigured season {year}"),
            });
        }
        if override_weeks == 0 || override_weeks > 18 {
            return Err(ConfigError::ValidationError {
                field: "league.week_overrides".into(),
                message: format!("override for {year} must be between 1 and 18"),
            });
        }
    }

    let tie = config.replacement.tie_value;
    if !(0.0..=1.0).contains(&tie) {
        return Err(ConfigError::ValidationError {
            field: "replacement.tie_value".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {tie}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
