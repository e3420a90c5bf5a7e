//! CLI subcommand implementations.

pub mod entities;
pub mod equipment;
pub mod events;
pub mod import;
pub mod record;
pub mod status;
mod util;
