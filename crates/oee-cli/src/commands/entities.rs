//! Entities command: prints the plant hierarchy as an indented tree.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use anyhow::Result;

use oee_core::EntityId;
use oee_db::{Database, EntityRecord};

pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let entities = db.list_entities()?;
    if entities.is_empty() {
        writeln!(writer, "No entities in catalog.")?;
        return Ok(());
    }
    write_tree(writer, &entities)
}

fn write_tree<W: Write>(writer: &mut W, entities: &[EntityRecord]) -> Result<()> {
    let names: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();

    // Entities whose parent is missing from the catalog are shown as roots.
    let mut children: BTreeMap<Option<&str>, Vec<&EntityRecord>> = BTreeMap::new();
    for entity in entities {
        let parent = entity
            .parent
            .as_ref()
            .map(EntityId::as_str)
            .filter(|p| names.contains(p));
        children.entry(parent).or_default().push(entity);
    }

    let mut stack: Vec<(&EntityRecord, usize)> = children
        .get(&None)
        .map(|roots| roots.iter().rev().map(|e| (*e, 0)).collect())
        .unwrap_or_default();
    while let Some((entity, depth)) = stack.pop() {
        write!(
            writer,
            "{:indent$}{} [{}]",
            "",
            entity.name,
            entity.level,
            indent = depth * 2
        )?;
        if let Some(job) = &entity.current_job {
            write!(writer, " job={job}")?;
        }
        if let Some(material) = &entity.current_material {
            write!(writer, " material={material}")?;
        }
        writeln!(writer)?;

        if let Some(kids) = children.get(&Some(entity.name.as_str())) {
            stack.extend(kids.iter().rev().map(|e| (*e, depth + 1)));
        }
    }
    Ok(())
}
