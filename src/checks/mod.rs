//! The built-in checkers.
//!
//! Checkers are grouped by what they look at:
//! - `generic`: method and domain validity (no network access)
//! - `caa`: CAA policy chain walk
//! - `dns01`: challenge TXT record checks
//! - `nameservers`: authoritative nameserver consistency
//! - `http01`: A/AAAA resolution and emulated HTTP-01 requests
//! - `cloudflare`: Cloudflare CDN detection
//! - `status`: incidents on the CA's status page

mod caa;
mod cloudflare;
mod dns01;
mod generic;
mod http01;
mod nameservers;
mod status;

use std::sync::Arc;

use crate::checker::{AsyncCheckerBlock, Checker};

// Re-export public API
pub use caa::{evaluate_caa, CaaChecker};
pub use cloudflare::CloudflareChecker;
pub use dns01::{TxtDoubledLabelChecker, TxtRecordChecker, WildcardDns01OnlyChecker};
pub use generic::{DisabledMethodChecker, ValidDomainChecker, ValidMethodChecker};
pub use http01::{DnsAChecker, HttpAccessibilityChecker};
pub use nameservers::NameserverConsistencyChecker;
pub use status::StatusIoChecker;

/// The checkers a scan runs, in order.
///
/// Cheap checks that can rule out issuance on their own come first, so a
/// fatal finding stops the scan before the network-heavy checks start.
pub fn default_checkers() -> Vec<Arc<dyn Checker>> {
    vec![
        Arc::new(ValidMethodChecker),
        Arc::new(DisabledMethodChecker),
        Arc::new(ValidDomainChecker),
        Arc::new(WildcardDns01OnlyChecker),
        Arc::new(CaaChecker),
        Arc::new(AsyncCheckerBlock::new(vec![
            Arc::new(DnsAChecker),
            Arc::new(TxtRecordChecker),
            Arc::new(TxtDoubledLabelChecker),
            Arc::new(NameserverConsistencyChecker),
        ])),
        Arc::new(HttpAccessibilityChecker),
        Arc::new(CloudflareChecker),
        Arc::new(StatusIoChecker::new()),
    ]
}
