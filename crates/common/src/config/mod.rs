//! # Configuration
//!
//! Figment-based layered loading and the configuration types shared by
//! every gpu-bench component.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
