//! Error handling.
//!
//! This module provides:
//! - Error type definitions (lookup, checker, scan, configuration, initialization)
//! - Helpers to render error chains and panic payloads as text
//!
//! Errors are categorized into:
//! - **Not applicable**: a checker declines to run; invisible to the caller
//! - **Lookup errors**: failed DNS queries, usually converted into problems
//! - **Scan errors**: infrastructure faults that abort a scan

mod types;

use std::any::Any;
use std::error::Error as StdError;

// Re-export public API
pub use types::{CheckError, ConfigError, InitializationError, LookupError, ScanError};

/// Renders an error and all of its sources as `outer: inner: innermost`.
///
/// `reqwest` and `hyper` errors print only their outermost layer, which
/// rarely says what actually went wrong on the wire.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        // Some layers repeat their source's message verbatim
        if parts.last().map(|last| !last.contains(&text)).unwrap_or(true) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}

/// Extracts a printable message from a panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
