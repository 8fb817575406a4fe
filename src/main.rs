// ffWAR query tool entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays clean for export output)
// 2. Load config
// 3. Ingest weekly facts and placements
// 4. Parse the query from the command line
// 5. Open the result cache
// 6. Run the scoped query
// 7. Write the outcome to stdout

use patriot_center::cache::SqliteCache;
use patriot_center::cli;
use patriot_center::config;
use patriot_center::export;
use patriot_center::ingest;
use patriot_center::war;

use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        league = %config.league.name,
        seasons = config.league.league_ids.len(),
        "config loaded"
    );

    // 3. Ingest weekly facts
    let (facts, report) =
        ingest::load_facts(Path::new(&config.data_dir), &config).context("failed to load facts")?;
    for excluded in &report.excluded_weeks {
        warn!(
            season = excluded.season,
            week = excluded.week,
            issue = %excluded.issue,
            "week excluded from aggregation"
        );
    }
    if let Some(year) = report.missing_current_season {
        warn!(year, "season is configured but has no week data yet");
    }
    info!(
        seasons = facts.seasons.len(),
        weeks = facts.weeks().count(),
        "facts loaded"
    );

    // 4. Parse the query
    let options = war::options(&facts);
    let tokens: Vec<String> = std::env::args().skip(1).collect();
    let args = cli::parse_args(&tokens, &options).context("invalid arguments")?;

    // 5. Open the result cache; --refresh recomputes from scratch
    let cache = if args.refresh {
        None
    } else {
        Some(SqliteCache::open(&config.cache_db).context("failed to open result cache")?)
    };

    // 6. Run the query
    let outcome = war::query(
        &facts,
        &args.filter,
        config.replacement.pool,
        config.replacement.tie_value,
        cache
            .as_ref()
            .map(|c| c as &dyn patriot_center::cache::ResultCache),
    );
    info!(
        scope_key = %args.filter.scope_key(),
        records = outcome.records.len(),
        gaps = outcome.missing_baselines.len(),
        "query complete"
    );

    // 7. Write the outcome
    let stdout = std::io::stdout();
    export::write_outcome(&outcome, args.format, stdout.lock())
        .context("failed to write results")?;

    Ok(())
}

/// Tracing goes to stderr so exported results on stdout stay pipeable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("patriot_center=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
