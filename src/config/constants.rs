//! Configuration constants.
//!
//! This module defines the timeouts, size limits and fixed identifiers that
//! control how closely a scan emulates the CA's validation server.

use std::time::Duration;

// Network operation timeouts
/// Ceiling for a single validating DNS resolution.
/// The validation server gives slow nameservers a long time before giving up,
/// so a scan must too: a lookup that exceeds this is reported as a timeout,
/// which is operationally different from NXDOMAIN.
pub const DNS_TIMEOUT_SECS: u64 = 60;
/// Per-attempt timeout handed to the underlying resolver.
pub const DNS_ATTEMPT_TIMEOUT_SECS: u64 = 20;
/// Timeout for one direct query sent straight to an authoritative nameserver.
pub const DIRECT_QUERY_TIMEOUT_SECS: u64 = 10;
/// Timeout for the best-effort extended DNS error query on bogus answers.
pub const EXTENDED_ERROR_TIMEOUT_SECS: u64 = 5;
/// Total timeout for one emulated HTTP-01 request (including redirects).
pub const HTTP_TIMEOUT_SECS: u64 = 10;
/// Timeout for the Cloudflare detection requests.
pub const CLOUDFLARE_TIMEOUT_SECS: u64 = 10;

/// Idle timeout of the single-shot HTTP transport.
pub const HTTP_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

// Validation server emulation
/// Maximum redirects the validation server follows; the 11th is rejected.
pub const MAX_REDIRECT_HOPS: usize = 10;
/// The only ports a redirect may explicitly name.
pub const ALLOWED_REDIRECT_PORTS: [u16; 2] = [80, 443];
/// Minimum number of response body bytes kept from a probe.
pub const MAX_BODY_SNIPPET_BYTES: usize = 8192;

/// Issuer domain the CA publishes for CAA `issue`/`issuewild` records.
pub const CA_ISSUER_DOMAIN: &str = "letsencrypt.org";

/// Default last path segment probed under `/.well-known/acme-challenge/`.
pub const DEFAULT_HTTP_REQUEST_PATH: &str = "letsdebug-test";
/// Maximum length of operator-supplied scan options.
pub const MAX_OPTION_LENGTH: usize = 255;

/// User-Agent sent with every emulated validation request.
pub const VALIDATION_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; ACME precheck emulating Let's Encrypt validation server)";

/// Public resolver asked for an extended DNS error when validation is bogus.
pub const EXTENDED_ERROR_RESOLVER: &str = "8.8.8.8:53";

/// Announcement explaining why the tls-sni methods were disabled.
pub const TLS_SNI_DISABLED_URL: &str =
    "https://community.letsencrypt.org/t/important-what-you-need-to-know-about-tls-sni-validation-issues/50811";

/// Label prefixed to a domain for DNS-01 challenge records.
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

// CA status page
/// Public status.io API endpoint for the CA's status page.
pub const STATUS_API_URL: &str = "https://api.status.io/1.0/status/55957a99e800baa4470002da";
/// Human-readable status page linked from status problems.
pub const STATUS_PAGE_URL: &str = "https://letsencrypt.status.io/";
/// Timeout for the status page request.
pub const STATUS_TIMEOUT_SECS: u64 = 10;
/// status.io code for "Operational".
pub const STATUS_OPERATIONAL_CODE: u16 = 100;
