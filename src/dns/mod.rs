//! DNS resolution.
//!
//! This module provides the two ways a scan talks to DNS:
//! - [`DnsResolver`]: lookups through a DNSSEC-validating resolver, exactly
//!   as the CA's validation server would see them
//! - [`DirectResolver`]: raw queries sent straight to one nameserver address,
//!   used to compare authoritative answers
//!
//! Both are traits so that scans can be driven by stub resolvers in tests.

mod direct;
mod extended;
mod records;
mod resolver;

use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{Record, RecordType};

use crate::error_handling::LookupError;

// Re-export public API
pub use direct::UdpDirectResolver;
pub use extended::{ExtendedError, ExtendedErrorProbe, ExtendedErrorSource};
pub use records::{
    addresses, format_records, normalize_fqdn, to_fqdn, txt_strings, CaaRecord,
};
pub use resolver::ValidatingResolver;

/// Resolves names the way the validation server does.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolves `name` (trailing dot optional) for `rtype`.
    ///
    /// Returns the answer records in the order the resolver produced them.
    /// NXDOMAIN and empty answers are `Ok(vec![])`; SERVFAIL, REFUSED,
    /// bogus DNSSEC and timeouts are errors.
    async fn lookup(&self, name: &str, rtype: RecordType) -> Result<Vec<Record>, LookupError>;
}

/// Answer to a query sent directly to a single nameserver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectAnswer {
    /// RCODE of the response
    pub response_code: ResponseCode,
    /// Answer section, in wire order
    pub answers: Vec<Record>,
}

/// Sends one query straight to a specific nameserver address.
#[async_trait]
pub trait DirectResolver: Send + Sync {
    /// Asks `server` for `name`/`rtype` and returns its raw answer.
    async fn query(
        &self,
        server: IpAddr,
        name: &str,
        rtype: RecordType,
    ) -> Result<DirectAnswer, LookupError>;
}
