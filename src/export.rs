// Query result export (JSON and CSV).

use std::io::Write;

use anyhow::{Context, Result};

use crate::war::query::QueryOutcome;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    /// Parse a format name as given on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// Write the outcome in the requested format.
pub fn write_outcome<W: Write>(outcome: &QueryOutcome, format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(outcome, out),
        OutputFormat::Csv => write_csv(outcome, out),
    }
}

/// Pretty-printed JSON of the whole outcome, gaps included.
pub fn write_json<W: Write>(outcome: &QueryOutcome, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, outcome).context("failed to serialize outcome")?;
    out.write_all(b"\n").context("failed to write output")?;
    Ok(())
}

/// Flat CSV of the records. Baseline gaps have no tabular shape here and
/// are the caller's to surface; placements flatten to `year:place` pairs
/// joined with `;`.
pub fn write_csv<W: Write>(outcome: &QueryOutcome, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record([
            "key",
            "player_id",
            "manager",
            "position",
            "total_points",
            "num_games_started",
            "ffWAR",
            "playoff_placements",
        ])
        .context("failed to write CSV header")?;

    for record in &outcome.records {
        let placements = record
            .playoff_placements
            .iter()
            .map(|(year, place)| format!("{year}:{place}"))
            .collect::<Vec<_>>()
            .join(";");
        writer
            .write_record([
                record.key.as_str(),
                record.player_id.as_str(),
                record.manager.as_deref().unwrap_or(""),
                record.position.display_str(),
                &record.total_points.to_string(),
                &record.num_games_started.to_string(),
                &record.ffwar.to_string(),
                &placements,
            ])
            .with_context(|| format!("failed to write CSV row for {}", record.key))?;
    }

    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}
