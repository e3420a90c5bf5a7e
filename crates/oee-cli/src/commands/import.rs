//! Import command for loading a plant catalog into the local `SQLite` store.

use std::io::Read;

use anyhow::{Context, Result};

use oee_db::{Catalog, CatalogCounts, Database};

pub fn run<R: Read>(db: &mut Database, reader: R) -> Result<CatalogCounts> {
    let catalog = parse_catalog(reader)?;
    let counts = db
        .import_catalog(&catalog)
        .context("failed to import catalog")?;
    Ok(counts)
}

fn parse_catalog<R: Read>(mut reader: R) -> Result<Catalog> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("failed to read catalog")?;
    if input.trim().is_empty() {
        anyhow::bail!("empty catalog");
    }
    serde_json::from_str(&input).context("invalid catalog JSON")
}
