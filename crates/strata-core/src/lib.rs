//! Core types, configuration, and error handling for strata.
//!
//! Shared foundation for the history crate and the CLI:
//! - [`StrataError`]: unified error type using `thiserror`
//! - [`StrataConfig`]: configuration loaded from `.strata.toml`
//! - [`OutputFormat`]: how results are rendered

mod config;
mod error;
mod types;

pub use config::{MiningConfig, SegmentsConfig, StrataConfig};
pub use error::StrataError;
pub use types::OutputFormat;

/// A convenience `Result` type for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
