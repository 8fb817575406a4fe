// Command-line argument parsing.
//
// Filter arguments are positional and inferred from their shape: a number
// matching a configured season is a season, a number from 1 to 17 is a
// week, a position code is a position, and a known manager name is a
// manager. Order never matters, so `2022 7 Jack QB` and `QB Jack 2022 7`
// mean the same query.

use thiserror::Error;

use crate::export::OutputFormat;
use crate::league::position::Position;
use crate::war::scope::{QueryFilter, ValidOptions};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unrecognized argument `{0}` (expected a season, week, manager, or position)")]
    UnknownArgument(String),

    #[error("{kind} given twice: `{value}`")]
    DuplicateArgument { kind: &'static str, value: String },

    #[error("a week filter requires a season (got week {0} alone)")]
    WeekWithoutSeason(u8),

    #[error("--format requires a value (json or csv)")]
    MissingFormatValue,

    #[error("unknown output format `{0}` (expected json or csv)")]
    UnknownFormat(String),
}

// ---------------------------------------------------------------------------
// Parsed invocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub filter: QueryFilter,
    pub format: OutputFormat,
    /// Skip the cache entirely and recompute.
    pub refresh: bool,
}

/// Parse command-line tokens against the valid filter options.
pub fn parse_args(tokens: &[String], options: &ValidOptions) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token.as_str() {
            "--format" => {
                let value = iter.next().ok_or(CliError::MissingFormatValue)?;
                args.format = OutputFormat::parse(value)
                    .ok_or_else(|| CliError::UnknownFormat(value.clone()))?;
            }
            "--refresh" => args.refresh = true,
            _ => infer_filter_token(token, options, &mut args.filter)?,
        }
    }

    if let Some(week) = args.filter.week {
        if args.filter.season.is_none() {
            return Err(CliError::WeekWithoutSeason(week));
        }
    }

    Ok(args)
}

fn infer_filter_token(
    token: &str,
    options: &ValidOptions,
    filter: &mut QueryFilter,
) -> Result<(), CliError> {
    if let Ok(number) = token.parse::<u16>() {
        // Season years and week numbers never overlap: weeks stop at 17.
        if options.seasons.contains(&number) {
            return set_once(&mut filter.season, number, "season", token);
        }
        if (1..=17).contains(&number) {
            return set_once(&mut filter.week, number as u8, "week", token);
        }
        return Err(CliError::UnknownArgument(token.to_string()));
    }

    if let Some(position) = Position::from_str_pos(token) {
        return set_once(&mut filter.position, position, "position", token);
    }

    if let Some(manager) = options
        .managers
        .iter()
        .find(|m| m.eq_ignore_ascii_case(token))
    {
        return set_once(&mut filter.manager, manager.clone(), "manager", token);
    }

    Err(CliError::UnknownArgument(token.to_string()))
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    kind: &'static str,
    token: &str,
) -> Result<(), CliError> {
    if slot.is_some() {
        return Err(CliError::DuplicateArgument {
            kind,
            value: token.to_string(),
        });
    }
    *slot = Some(value);
    Ok(())
}
