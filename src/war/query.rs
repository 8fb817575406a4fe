// Scope query layer.
//
// Resolves a filter set against the league facts and runs the full
// pipeline: per-week baselines, per-slot matchup simulation, and the
// aggregation fold. Results are cacheable by the filter's deterministic
// scope key; cache failures degrade to recomputation and are never fatal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::league::facts::{LeagueFacts, Week};
use crate::league::position::Position;
use crate::war::aggregate::{Accumulator, WarRecord};
use crate::war::baseline::{BaselineSet, ReplacementPool};
use crate::war::scope::{QueryFilter, ValidOptions};
use crate::war::simulate::simulate;

// ---------------------------------------------------------------------------
// Query outcome
// ---------------------------------------------------------------------------

/// A (season, week, position) for which no replacement baseline existed.
/// Slots at such positions still contribute points and games started, but
/// no ffWAR delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingBaseline {
    pub season: u16,
    pub week: u8,
    pub position: Position,
}

/// The full result of one scoped query: the aggregated records plus any
/// baseline gaps hit along the way. Partial results carry their gaps
/// explicitly rather than silently zero-filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub records: Vec<WarRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_baselines: Vec<MissingBaseline>,
}

// ---------------------------------------------------------------------------
// Query execution
// ---------------------------------------------------------------------------

/// Run a scoped ffWAR query.
///
/// The pipeline is deterministic over (`facts`, `filter`, `pool`,
/// `tie_value`), so a cache hit on the filter's scope key is always valid
/// for unchanged facts. Cache get/put failures are logged and ignored.
pub fn query(
    facts: &LeagueFacts,
    filter: &QueryFilter,
    pool: ReplacementPool,
    tie_value: f64,
    cache: Option<&dyn ResultCache>,
) -> QueryOutcome {
    let scope_key = filter.scope_key();

    if let Some(cache) = cache {
        match cache.get(&scope_key) {
            Ok(Some(payload)) => match serde_json::from_str::<QueryOutcome>(&payload) {
                Ok(outcome) => {
                    debug!(%scope_key, "serving query from cache");
                    return outcome;
                }
                Err(e) => {
                    warn!(%scope_key, error = %e, "discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(%scope_key, error = %e, "cache read failed, recomputing");
            }
        }
    }

    let outcome = compute(facts, filter, pool, tie_value);

    if let Some(cache) = cache {
        match serde_json::to_string(&outcome) {
            Ok(payload) => {
                if let Err(e) = cache.put(&scope_key, &payload) {
                    warn!(%scope_key, error = %e, "cache write failed");
                }
            }
            Err(e) => {
                warn!(%scope_key, error = %e, "failed to serialize outcome for cache");
            }
        }
    }

    outcome
}

fn compute(
    facts: &LeagueFacts,
    filter: &QueryFilter,
    pool: ReplacementPool,
    tie_value: f64,
) -> QueryOutcome {
    let weeks = filter.select_weeks(facts);
    let baselines = BaselineSet::compute(&weeks, pool);

    // Fold one accumulator per week, then merge. Merge order cannot change
    // the result, so any future parallel split along weeks stays correct.
    let accumulated = weeks
        .iter()
        .map(|week| accumulate_week(week, &baselines, tie_value))
        .fold(Accumulator::new(), Accumulator::merge);

    let years: Vec<u16> = weeks
        .iter()
        .map(|w| w.season)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // The manager filter selects the (player, manager) grain; without it
    // every player's stints collapse into a single record.
    let mut records = match &filter.manager {
        Some(manager) => {
            let mut records = accumulated.into_manager_records(facts, &years);
            records.retain(|r| r.manager.as_deref() == Some(manager.as_str()));
            records
        }
        None => accumulated.into_player_records(),
    };

    // Position is a post-aggregation filter: baselines and simulations above
    // already ran over every position, so the numbers match the unfiltered
    // query restricted to this position.
    if let Some(position) = filter.position {
        records.retain(|r| r.position == position);
    }

    records.sort_by(|a, b| {
        b.ffwar
            .partial_cmp(&a.ffwar)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.manager.cmp(&b.manager))
    });

    let missing_baselines = baselines
        .missing()
        .map(|&(season, week, position)| MissingBaseline {
            season,
            week,
            position,
        })
        .collect();

    QueryOutcome {
        records,
        missing_baselines,
    }
}

fn accumulate_week(week: &Week, baselines: &BaselineSet, tie_value: f64) -> Accumulator {
    let mut acc = Accumulator::new();

    for matchup in &week.matchups {
        for (own_idx, own) in matchup.sides.iter().enumerate() {
            let opponent = &matchup.sides[1 - own_idx];
            for slot in &own.slots {
                if !slot.started {
                    acc.record_rostered(slot, &own.manager);
                    continue;
                }
                let delta = baselines
                    .get(week.season, week.number, slot.position)
                    .map(|baseline| {
                        simulate(slot, own, opponent, baseline).war_delta(tie_value)
                    });
                acc.record_started(slot, &own.manager, delta);
            }
        }
    }

    acc
}

// ---------------------------------------------------------------------------
// Valid filter options
// ---------------------------------------------------------------------------

/// Enumerate the selectable seasons, weeks, and managers across the facts.
pub fn options(facts: &LeagueFacts) -> ValidOptions {
    let weeks: BTreeSet<u8> = facts.weeks().map(|w| w.number).collect();
    ValidOptions {
        seasons: facts.years(),
        weeks: weeks.into_iter().collect(),
        managers: facts.managers().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::league::facts::{Matchup, RosterSlot, RosterSnapshot, SeasonFacts};

    fn slot(id: &str, pos: Position, points: f64, started: bool) -> RosterSlot {
        RosterSlot {
            player_id: id.to_string(),
            display_name: id.to_string(),
            position: pos,
            points,
            started,
        }
    }

    fn side(manager: &str, slots: Vec<RosterSlot>) -> RosterSnapshot {
        RosterSnapshot {
            manager: manager.to_string(),
            slots,
        }
    }

    /// Two managers, one matchup per week. Jack's QB scores 20 then 30;
    /// Sam's QB scores 10 both weeks. Jack also stashes a benched RB.
    fn two_week_facts() -> LeagueFacts {
        let week = |number: u8, jack_qb: f64| Week {
            season: 2021,
            number,
            matchups: vec![Matchup {
                sides: [
                    side(
                        "Jack",
                        vec![
                            slot("qb-j", Position::Quarterback, jack_qb, true),
                            slot("rb-bench", Position::RunningBack, 8.0, false),
                        ],
                    ),
                    side("Sam", vec![slot("qb-s", Position::Quarterback, 10.0, true)]),
                ],
            }],
        };
        LeagueFacts {
            seasons: vec![SeasonFacts {
                year: 2021,
                weeks: vec![week(1, 20.0), week(2, 30.0)],
            }],
            placements: Default::default(),
        }
    }

    #[test]
    fn repeated_queries_are_identical() {
        let facts = two_week_facts();
        let filter = QueryFilter::default();
        let a = query(&facts, &filter, ReplacementPool::StartersOnly, 0.5, None);
        let b = query(&facts, &filter, ReplacementPool::StartersOnly, 0.5, None);
        assert_eq!(a, b);
    }

    #[test]
    fn rostered_but_never_started_player_gets_zero_record() {
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::AllRostered,
            0.5,
            None,
        );

        let bench = outcome
            .records
            .iter()
            .find(|r| r.player_id == "rb-bench")
            .expect("benched player should still appear");
        assert_eq!(bench.total_points, 0.0);
        assert_eq!(bench.num_games_started, 0);
        assert_eq!(bench.ffwar, 0.0);
    }

    #[test]
    fn position_filter_is_applied_after_aggregation() {
        let facts = two_week_facts();
        let unfiltered = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );
        let filtered = query(
            &facts,
            &QueryFilter {
                position: Some(Position::Quarterback),
                ..Default::default()
            },
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        let expected: Vec<_> = unfiltered
            .records
            .iter()
            .filter(|r| r.position == Position::Quarterback)
            .cloned()
            .collect();
        assert_eq!(filtered.records, expected);
        assert!(!filtered.records.is_empty());
    }

    #[test]
    fn manager_filter_selects_manager_grain() {
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter {
                manager: Some("Jack".to_string()),
                ..Default::default()
            },
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        assert!(!outcome.records.is_empty());
        assert!(outcome
            .records
            .iter()
            .all(|r| r.manager.as_deref() == Some("Jack")));
        assert!(outcome.records.iter().all(|r| r.player_id != "qb-s"));
    }

    #[test]
    fn week_filter_narrows_scope() {
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter {
                season: Some(2021),
                week: Some(1),
                ..Default::default()
            },
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        let qb = outcome
            .records
            .iter()
            .find(|r| r.player_id == "qb-j")
            .unwrap();
        assert_eq!(qb.num_games_started, 1);
        assert_eq!(qb.total_points, 20.0);
        // Week 1: Jack wins 20-10; QB replaced by the 15.0 starters mean
        // still wins 15-10. Delta 0.
        assert_eq!(qb.ffwar, 0.0);
    }

    #[test]
    fn missing_baselines_are_reported_not_zeroed() {
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        // Only QB (and the benched RB under AllRostered, but this is
        // StartersOnly) has pool data; the other positions are gaps.
        assert!(outcome
            .missing_baselines
            .iter()
            .any(|m| m.position == Position::Kicker && m.season == 2021));
        assert!(!outcome
            .missing_baselines
            .iter()
            .any(|m| m.position == Position::Quarterback));
    }

    #[test]
    fn benched_slots_feed_the_all_rostered_pool() {
        // The only RB in the league is benched, so the RB baseline exists
        // under AllRostered even though nobody ever started an RB.
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::AllRostered,
            0.5,
            None,
        );
        assert!(!outcome
            .missing_baselines
            .iter()
            .any(|m| m.position == Position::RunningBack));
    }

    #[test]
    fn opponent_bench_is_neutral_under_starters_pool() {
        let mut facts = two_week_facts();
        let baseline_outcome = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        // Drop a monster QB on Sam's bench; no started totals change and
        // the starters-only pool ignores him.
        facts.seasons[0].weeks[0].matchups[0].sides[1]
            .slots
            .push(slot("qb-stash", Position::Quarterback, 50.0, false));
        let perturbed = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );

        for before in &baseline_outcome.records {
            let after = perturbed
                .records
                .iter()
                .find(|r| r.player_id == before.player_id)
                .unwrap();
            assert_eq!(before.ffwar, after.ffwar, "player {}", before.player_id);
        }
    }

    #[test]
    fn cache_stores_and_serves_outcomes() {
        let facts = two_week_facts();
        let cache = MemoryCache::new();
        let filter = QueryFilter {
            season: Some(2021),
            ..Default::default()
        };

        assert!(cache.is_empty());
        let first = query(
            &facts,
            &filter,
            ReplacementPool::StartersOnly,
            0.5,
            Some(&cache),
        );
        assert_eq!(cache.len(), 1);

        // A hit must be served verbatim from the cache, so changed facts go
        // unnoticed until the entry is invalidated.
        let mut stale_facts = facts.clone();
        stale_facts.seasons[0].weeks.pop();
        let second = query(
            &stale_facts,
            &filter,
            ReplacementPool::StartersOnly,
            0.5,
            Some(&cache),
        );
        assert_eq!(first, second);
    }

    #[test]
    fn undecodable_cache_entry_falls_back_to_computation() {
        let facts = two_week_facts();
        let cache = MemoryCache::new();
        let filter = QueryFilter::default();
        cache.put(&filter.scope_key(), "not json").unwrap();

        let outcome = query(
            &facts,
            &filter,
            ReplacementPool::StartersOnly,
            0.5,
            Some(&cache),
        );
        assert!(!outcome.records.is_empty());
    }

    #[test]
    fn records_sort_by_war_descending() {
        let facts = two_week_facts();
        let outcome = query(
            &facts,
            &QueryFilter::default(),
            ReplacementPool::StartersOnly,
            0.5,
            None,
        );
        for pair in outcome.records.windows(2) {
            assert!(pair[0].ffwar >= pair[1].ffwar);
        }
    }

    #[test]
    fn options_enumerate_facts() {
        let facts = two_week_facts();
        let opts = options(&facts);
        assert_eq!(opts.seasons, vec![2021]);
        assert_eq!(opts.weeks, vec![1, 2]);
        assert_eq!(opts.managers, vec!["Jack".to_string(), "Sam".to_string()]);
    }
}
