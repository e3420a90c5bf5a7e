use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use oee_cli::commands::{entities, equipment, events, import, record, status};
use oee_cli::{Cli, Commands, Config, RecordEvent};
use oee_core::RecordedEvent;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(oee_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = oee_db::Database::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn print_recorded(event: &RecordedEvent) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    match command {
        Commands::Import => {
            let counts = import::run(&mut db, io::stdin().lock())?;
            eprintln!(
                "Imported {} entities, {} materials, {} reasons, {} equipment settings",
                counts.entities, counts.materials, counts.reasons, counts.equipment_materials
            );
        }
        Commands::Status => {
            status::run(&mut io::stdout().lock(), &db, &config.database_path)?;
        }
        Commands::Entities => {
            entities::run(&mut io::stdout().lock(), &db)?;
        }
        Commands::Equipment { name } => {
            equipment::run(&mut io::stdout().lock(), &db, name)?;
        }
        Commands::Record(event) => {
            let recorded = match event {
                RecordEvent::Availability(args) => record::availability(&mut db, &config, args)?,
                RecordEvent::Production(args) => record::production(&mut db, args)?,
                RecordEvent::Changeover(args) => record::changeover(&mut db, args)?,
            };
            print_recorded(&recorded)?;
        }
        Commands::Events { after, before } => {
            let written = events::run(
                &mut io::stdout().lock(),
                &db,
                after.as_deref(),
                before.as_deref(),
            )?;
            tracing::debug!(written, "dumped events");
        }
    }

    Ok(())
}
