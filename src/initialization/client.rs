//! HTTP client initialization.
//!
//! This module provides the shared clients used by checks that talk to a
//! domain the ordinary way (normal DNS, certificate verification on). The
//! HTTP-01 prober builds its own single-shot client per probe instead.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::VALIDATION_USER_AGENT;

/// Initializes the HTTP client with default settings.
///
/// Redirects are followed (reqwest's default limit of 10).
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(VALIDATION_USER_AGENT)
        .build()
}

/// Initializes a client that never follows redirects.
///
/// Used to read the headers of the first response only.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .user_agent(VALIDATION_USER_AGENT)
        .build()
}
