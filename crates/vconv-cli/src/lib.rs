//! Command-line front end for vconv.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - `key=value` parameter parsing into typed operation parameters

pub mod config;
pub mod params;

pub use config::{CliConfig, LogFormat};
pub use params::{default_output_path, params_object, parse_operation};
