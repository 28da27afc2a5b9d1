//! # Common
//!
//! Shared building blocks for the gpu-bench workspace:
//! - Layered configuration loading (defaults, TOML file, environment)
//! - Configuration error types
//! - Logging configuration shared by every binary

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
