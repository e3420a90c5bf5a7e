//! Events command for querying the local `SQLite` database.
//!
//! Outputs recorded events as JSONL, ordered by event time.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use oee_db::Database;

use super::util::parse_datetime;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    after: Option<&str>,
    before: Option<&str>,
) -> Result<usize> {
    let after = parse_bound(after, "after")?;
    let before = parse_bound(before, "before")?;

    let events = db.list_events_in_range(after, before)?;
    for event in &events {
        let recorded = event.to_recorded()?;
        writeln!(writer, "{}", serde_json::to_string(&recorded)?)?;
    }
    Ok(events.len())
}

fn parse_bound(s: Option<&str>, name: &str) -> Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_datetime(s).with_context(|| format!("invalid --{name} timestamp")))
        .transpose()
}
