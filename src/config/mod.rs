//! Engine configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, etc.)
//! - Per-scan options supplied by the operator
//! - Engine-wide configuration and CLI-facing option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{EngineConfig, LogFormat, LogLevel, ScanOptions, UpstreamResolver};
