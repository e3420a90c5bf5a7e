//! Operator event capture CLI library.
//!
//! Wires the capture builders in `oee-core` to the catalog and event store in
//! `oee-db`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, RecordEvent};
pub use config::Config;
