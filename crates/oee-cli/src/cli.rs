//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::record::{AvailabilityArgs, ChangeoverArgs, ProductionArgs};

/// Operator event capture for equipment-performance tracking.
///
/// Records availability, production and changeover events against leaf-level
/// equipment from a local plant catalog.
#[derive(Debug, Parser)]
#[command(name = "oee", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import a plant catalog (JSON) from stdin.
    Import,

    /// Show catalog and event counts.
    Status,

    /// Print the plant hierarchy.
    Entities,

    /// Show the recording context of an equipment.
    Equipment {
        /// Entity name as it appears in the catalog.
        name: String,
    },

    /// Record an event against an equipment.
    #[command(subcommand)]
    Record(RecordEvent),

    /// Dump recorded events as JSONL.
    Events {
        /// Only events at or after this time.
        #[arg(long)]
        after: Option<String>,

        /// Only events before this time.
        #[arg(long)]
        before: Option<String>,
    },
}

/// Event kinds that can be recorded.
#[derive(Debug, Subcommand)]
pub enum RecordEvent {
    /// Record that a reason applies, at a point in time or over a range.
    Availability(AvailabilityArgs),

    /// Record a good or reject/rework production count.
    Production(ProductionArgs),

    /// Change the job and material an equipment is running.
    Changeover(ChangeoverArgs),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_amount_reaches_the_builder() {
        let cli = Cli::try_parse_from([
            "oee",
            "record",
            "production",
            "--equipment",
            "Filler",
            "--classification",
            "good",
            "--amount",
            "-3",
        ])
        .unwrap();
        let Some(Commands::Record(RecordEvent::Production(args))) = cli.command else {
            panic!("expected record production");
        };
        assert_eq!(args.amount, "-3");
    }
}
