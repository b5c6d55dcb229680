//! CLI command implementations

pub mod diff;
pub mod list;
pub mod purge;
pub mod show;
