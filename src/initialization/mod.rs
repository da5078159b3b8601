//! Engine initialization and resource setup.
//!
//! This module provides functions to initialize all shared resources:
//! - Logger
//! - Validating DNS resolver and direct nameserver client
//! - HTTP clients for plain (non-emulated) requests
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod resolver;

// Re-export public API
pub use client::{init_client, init_redirect_client};
pub use logger::init_logger_with;
pub use resolver::{init_direct_resolver, init_resolver, resolver_opts};
