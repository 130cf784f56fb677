//! CLI commands

pub mod convert;
pub mod types;
pub mod validate;
