//! Error type definitions.
//!
//! Diagnostic findings are never errors: they are `Problem`s. The types here
//! cover the remaining cases, from a single failed DNS query (which checkers
//! usually turn into a problem) up to faults that abort a whole scan.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),

    /// The supplied engine configuration is unusable.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Invalid engine configuration or scan options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An operator-supplied option exceeds its length limit.
    #[error("{option} must be at most {max} characters")]
    OptionTooLong {
        /// Name of the offending option
        option: &'static str,
        /// Maximum accepted length
        max: usize,
    },

    /// The request path would escape the `/.well-known/acme-challenge/` segment.
    #[error("http_request_path {0:?} must be a single URL path segment")]
    InvalidRequestPath(String),

    /// A timeout was configured as zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    /// The per-attempt DNS timeout exceeds the overall DNS timeout.
    #[error("dns_attempt_timeout must not exceed dns_timeout")]
    AttemptExceedsTimeout,
}

/// Failure of one DNS resolution.
///
/// Lookup errors are cached alongside successful answers, so the type is
/// `Clone` and carries only owned text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No answer within the configured ceiling.
    #[error(
        "DNS lookup for {name}/{rtype} did not complete within {secs}s. \
         This usually means the domain's nameservers are slow or unresponsive"
    )]
    Timeout {
        /// Queried name
        name: String,
        /// Queried record type
        rtype: String,
        /// Timeout that elapsed, in seconds
        secs: u64,
    },

    /// The resolver answered with SERVFAIL or REFUSED.
    #[error("DNS response for {name}/{rtype} did not have an acceptable response code: {code}")]
    ResponseCode {
        /// Queried name
        name: String,
        /// Queried record type
        rtype: String,
        /// Response code text
        code: String,
    },

    /// DNSSEC validation of the answer failed.
    #[error(
        "DNSSEC: Bogus: validation of {name}/{rtype} failed: {reason}{}",
        .extended.as_deref().map(|e| format!(" (extended error: {e})")).unwrap_or_default()
    )]
    Bogus {
        /// Queried name
        name: String,
        /// Queried record type
        rtype: String,
        /// The validator's stated reason
        reason: String,
        /// Extended DNS error text from a public resolver, when available
        extended: Option<String>,
    },

    /// Any other resolution failure (network, malformed response, ...).
    #[error("Error resolving {name}/{rtype}: {message}")]
    Resolution {
        /// Queried name
        name: String,
        /// Queried record type
        rtype: String,
        /// Underlying error text
        message: String,
    },

    /// The name could not be turned into a DNS name.
    #[error("{name:?} is not a valid DNS name: {message}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Parser error text
        message: String,
    },
}

impl LookupError {
    /// True when the answer failed DNSSEC validation.
    pub fn is_bogus(&self) -> bool {
        matches!(self, LookupError::Bogus { .. })
    }
}

/// Outcome of a checker other than a list of problems.
#[derive(Error, Debug)]
pub enum CheckError {
    /// The checker does not apply to this domain and method.
    ///
    /// Never reported to the caller and never aborts a scan.
    #[error("Checker not applicable for this domain and method")]
    NotApplicable,

    /// A checker (or a member of an async block) panicked.
    #[error("checker panicked: {0}")]
    Panicked(String),

    /// An infrastructure failure inside the checker.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Failure of a whole scan.
///
/// No partial problem list accompanies a scan error.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The scan options were rejected before any network activity.
    #[error("invalid scan options: {0}")]
    InvalidOptions(#[from] ConfigError),

    /// A checker failed with something other than "not applicable".
    #[error("checker {checker} failed: {source}")]
    Checker {
        /// Name of the failing checker
        checker: &'static str,
        /// What went wrong
        #[source]
        source: CheckError,
    },

    /// A panic escaped the checkers and was recovered at the top level.
    #[error("scan aborted by a panic: {0}")]
    Panicked(String),
}
