//! Status command for showing catalog size and recorded events by type.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use oee_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let catalog = db.catalog_counts()?;
    let events = db.event_counts_by_type()?;

    writeln!(writer, "OEE capture status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(
        writer,
        "Catalog: {} entities, {} materials, {} reasons, {} equipment settings",
        catalog.entities, catalog.materials, catalog.reasons, catalog.equipment_materials
    )?;

    if events.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Events:")?;
    for count in events {
        writeln!(writer, "- {}: {}", count.kind, count.count)?;
    }

    Ok(())
}
