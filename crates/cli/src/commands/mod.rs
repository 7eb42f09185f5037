//! Subcommand implementations

pub mod analyze;
pub mod collect;
pub mod show;
