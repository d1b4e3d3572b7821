//! gradup-fixtures: where assessments come from.
//!
//! Implements the `AssessmentSource` trait for the built-in placement
//! simulation catalog, a directory of TOML files, and a remote HTTP
//! fixture service.

pub mod builtin;
pub mod config;
pub mod directory;
pub mod error;
pub mod http;

pub use config::{create_source, load_config, load_config_from, GradupConfig, SourceConfig};
pub use error::FixtureError;
