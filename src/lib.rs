//! acme_precheck library: ACME validation diagnostics
//!
//! This library re-enacts what a certificate authority's validation server
//! does before issuing a certificate for a domain (DNSSEC-validating DNS
//! lookups, CAA policy evaluation, emulated HTTP-01 requests, challenge TXT
//! record checks) and reports everything that would make validation fail as a
//! list of [`Problem`]s.
//!
//! # Example
//!
//! ```no_run
//! use acme_precheck::{sort_problems, Engine, EngineConfig, ScanOptions, ValidationMethod};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(EngineConfig::default())?;
//! let mut problems = engine
//!     .check("example.org", ValidationMethod::Http01, ScanOptions::default())
//!     .await?;
//! sort_problems(&mut problems);
//! for problem in problems.iter().filter(|p| !p.is_debug()) {
//!     println!("{}: {}", problem.severity, problem.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod checker;
pub mod checks;
pub mod config;
pub mod context;
pub mod dns;
mod domain;
mod error_handling;
pub mod fetch;
pub mod initialization;
mod method;
mod problem;
mod run;
mod security;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use checker::{AsyncCheckerBlock, Checker};
pub use config::{EngineConfig, LogFormat, LogLevel, ScanOptions, UpstreamResolver};
pub use context::ScanContext;
pub use error_handling::{
    error_chain, CheckError, ConfigError, InitializationError, LookupError, ScanError,
};
pub use method::ValidationMethod;
pub use problem::{has_fatal, sort_problems, Problem, Severity};
pub use run::Engine;
pub use security::is_address_reserved;
