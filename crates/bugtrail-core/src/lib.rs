//! Core types, configuration, and error handling for bugtrail.
//!
//! This crate provides the shared foundation used by the other bugtrail crates:
//! - [`BugtrailError`]: unified error type using `thiserror`
//! - [`BugtrailConfig`]: configuration loaded from `.bugtrail.toml`
//! - Shared types: [`Algorithm`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{BugtrailConfig, DatasetConfig, HistoryConfig, TrackerConfig};
pub use error::BugtrailError;
pub use types::{Algorithm, OutputFormat};

/// A convenience `Result` type for bugtrail operations.
pub type Result<T> = std::result::Result<T, BugtrailError>;
