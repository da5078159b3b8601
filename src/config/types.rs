//! Configuration types and CLI-facing options.
//!
//! This module defines the per-scan options an operator may supply, the
//! engine-wide configuration, and the logging enums used by the binary.

use std::net::SocketAddr;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::constants::{
    DEFAULT_HTTP_REQUEST_PATH, DIRECT_QUERY_TIMEOUT_SECS, DNS_ATTEMPT_TIMEOUT_SECS,
    DNS_TIMEOUT_SECS, EXTENDED_ERROR_RESOLVER, HTTP_TIMEOUT_SECS, MAX_OPTION_LENGTH,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Options scoped to a single scan.
///
/// Both values are operator supplied and bounded in length.
///
/// # Examples
///
/// ```
/// use acme_precheck::ScanOptions;
///
/// let options = ScanOptions {
///     http_expect_response: "token.thumbprint".to_string(),
///     ..Default::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Last path segment requested under `/.well-known/acme-challenge/`.
    pub http_request_path: String,

    /// Exact body the HTTP-01 probe must receive. Empty accepts any body.
    pub http_expect_response: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            http_request_path: DEFAULT_HTTP_REQUEST_PATH.to_string(),
            http_expect_response: String::new(),
        }
    }
}

impl ScanOptions {
    /// Checks length and character constraints on both options.
    ///
    /// An empty request path is replaced by the default at scan time, so it
    /// is accepted here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_request_path.len() > MAX_OPTION_LENGTH {
            return Err(ConfigError::OptionTooLong {
                option: "http_request_path",
                max: MAX_OPTION_LENGTH,
            });
        }
        if self
            .http_request_path
            .chars()
            .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidRequestPath(
                self.http_request_path.clone(),
            ));
        }
        if self.http_expect_response.len() > MAX_OPTION_LENGTH {
            return Err(ConfigError::OptionTooLong {
                option: "http_expect_response",
                max: MAX_OPTION_LENGTH,
            });
        }
        Ok(())
    }

    /// Request path with the default substituted for an empty value.
    pub fn request_path(&self) -> &str {
        if self.http_request_path.is_empty() {
            DEFAULT_HTTP_REQUEST_PATH
        } else {
            &self.http_request_path
        }
    }
}

/// Upstream recursive resolvers the validating resolver forwards to.
///
/// DNSSEC validation is always performed locally against the built-in root
/// trust anchor, whichever upstream is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum UpstreamResolver {
    /// 8.8.8.8, 8.8.4.4 and their IPv6 counterparts
    Google,
    /// 1.1.1.1, 1.0.0.1 and their IPv6 counterparts
    Cloudflare,
    /// 9.9.9.9, 149.112.112.112 and their IPv6 counterparts
    Quad9,
}

/// Engine-wide configuration (no CLI dependencies).
///
/// # Examples
///
/// ```
/// use acme_precheck::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig {
///     http_timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Overall ceiling for one validating DNS resolution
    pub dns_timeout: Duration,

    /// Per-attempt timeout for the validating resolver
    pub dns_attempt_timeout: Duration,

    /// Timeout for a direct query to an authoritative nameserver
    pub direct_query_timeout: Duration,

    /// Timeout for one emulated HTTP-01 request
    pub http_timeout: Duration,

    /// Upstream resolvers used by the validating resolver
    pub upstream: UpstreamResolver,

    /// Resolver asked for extended DNS errors on bogus answers (`None` disables it)
    ///
    /// Upstream validators answer a bogus zone with a bare SERVFAIL. Only the
    /// extended error tells the two apart, so without this resolver (or when
    /// it does not answer in time) such a lookup is reported as a SERVFAIL
    /// response code rather than as a DNSSEC failure. Bogus answers detected
    /// by the local validator are classified either way.
    pub extended_error_resolver: Option<SocketAddr>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dns_timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
            dns_attempt_timeout: Duration::from_secs(DNS_ATTEMPT_TIMEOUT_SECS),
            direct_query_timeout: Duration::from_secs(DIRECT_QUERY_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            upstream: UpstreamResolver::Google,
            extended_error_resolver: EXTENDED_ERROR_RESOLVER.parse().ok(),
        }
    }
}

impl EngineConfig {
    /// Rejects zero timeouts and an attempt timeout longer than the overall one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("dns_timeout", self.dns_timeout),
            ("dns_attempt_timeout", self.dns_attempt_timeout),
            ("direct_query_timeout", self.direct_query_timeout),
            ("http_timeout", self.http_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }
        if self.dns_attempt_timeout > self.dns_timeout {
            return Err(ConfigError::AttemptExceedsTimeout);
        }
        Ok(())
    }
}
