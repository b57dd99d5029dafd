//! Shared plumbing for the DriveQuest crates: logging setup, layered
//! configuration loading and identifier generation.

pub mod config;
pub mod ids;
pub mod logging;

pub use config::{ConfigLoader, ConfigurationError};
