//! Equipment command: shows the context a recording against it would use.

use std::io::Write;

use anyhow::Result;

use oee_core::{Equipment, UnitOfMeasure};
use oee_db::Database;

use super::record::{resolve, select};

pub fn run<W: Write>(writer: &mut W, db: &Database, name: &str) -> Result<()> {
    let selected = select(db, name)?;
    let equipment = resolve(&selected)?;
    write_context(writer, equipment)
}

fn write_context<W: Write>(writer: &mut W, equipment: &Equipment) -> Result<()> {
    writeln!(writer, "Equipment: {}", equipment.name)?;
    if let Some(description) = &equipment.description {
        writeln!(writer, "Description: {description}")?;
    }
    writeln!(
        writer,
        "Current job: {}",
        equipment.current_job.as_deref().unwrap_or("-")
    )?;
    writeln!(
        writer,
        "Current material: {}",
        equipment
            .current_material
            .as_ref()
            .map_or("-", |m| m.name.as_str())
    )?;

    if equipment.materials.is_empty() {
        writeln!(writer, "No material settings.")?;
        return Ok(());
    }

    writeln!(writer, "Material settings:")?;
    for config in equipment.materials.values() {
        writeln!(
            writer,
            "- {}: good={} reject={}",
            config.material,
            unit_or_dash(config.run_rate_uom.as_ref()),
            unit_or_dash(config.reject_uom.as_ref()),
        )?;
    }
    Ok(())
}

fn unit_or_dash(unit: Option<&UnitOfMeasure>) -> &str {
    unit.map_or("-", |u| u.symbol.as_str())
}
