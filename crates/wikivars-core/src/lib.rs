//! Scoped template variables and their persistence
//!
//! - [`frame`] / [`resolver`]: variables bound in nested template frames
//! - [`set`] / [`upsert`]: saved variable sets and how they reach storage
//! - [`gateway`]: storage backends
//! - [`render`]: the engine a host drives during one render

pub mod config;
pub mod error;
pub mod frame;
pub mod gateway;
pub mod lock;
pub mod render;
pub mod resolver;
pub mod set;
pub mod upsert;
pub mod variable;

pub use error::{Result, VarsError};
