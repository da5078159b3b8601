//! The DNSSEC-validating resolver adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{Name, Record, RecordType};
use hickory_resolver::TokioAsyncResolver;
use log::{debug, warn};

use super::extended::{ExtendedError, ExtendedErrorSource};
use super::records::to_fqdn;
use super::DnsResolver;
use crate::error_handling::{error_chain, LookupError};

/// Substrings that mark a resolver error as a DNSSEC validation failure.
const DNSSEC_FAILURE_MARKERS: &[&str] = &["rrsig", "dnssec", "dnskey", "signature", "nsec"];

/// A resolver error reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// The upstream answered without records, with this response code
    Rcode(ResponseCode),
    /// An attempt timed out inside the resolver
    Timeout,
    /// Anything else, as its error chain
    Other(String),
}

impl From<&ResolveError> for Failure {
    fn from(err: &ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => Failure::Rcode(*response_code),
            ResolveErrorKind::Timeout => Failure::Timeout,
            _ => Failure::Other(error_chain(err)),
        }
    }
}

/// Adapts a validating [`TokioAsyncResolver`] to [`DnsResolver`].
///
/// Every lookup is bounded by an overall ceiling on top of the resolver's
/// own per-attempt timeout.
///
/// An upstream SERVFAIL or REFUSED is only reported as
/// [`LookupError::Bogus`] when the configured [`ExtendedErrorSource`]
/// confirms a DNSSEC fault; without a source it stays a
/// [`LookupError::ResponseCode`].
#[derive(Clone)]
pub struct ValidatingResolver {
    resolver: Arc<TokioAsyncResolver>,
    timeout: Duration,
    extended: Option<Arc<dyn ExtendedErrorSource>>,
}

impl ValidatingResolver {
    /// Wraps `resolver`, giving up on any lookup after `timeout`.
    pub fn new(resolver: Arc<TokioAsyncResolver>, timeout: Duration) -> Self {
        Self {
            resolver,
            timeout,
            extended: None,
        }
    }

    /// Enriches bogus answers with the Extended DNS Error from `source`.
    pub fn with_extended_errors(mut self, source: Arc<dyn ExtendedErrorSource>) -> Self {
        self.extended = Some(source);
        self
    }

    async fn classify(
        &self,
        fqdn: &str,
        query_name: &Name,
        rtype: RecordType,
        failure: Failure,
    ) -> Result<Vec<Record>, LookupError> {
        match failure {
            Failure::Rcode(code @ (ResponseCode::ServFail | ResponseCode::Refused)) => {
                // Upstream validators answer SERVFAIL for bogus zones
                if let Some(ede) = self.extended_error(query_name, rtype).await {
                    if ede.is_dnssec() {
                        return Err(LookupError::Bogus {
                            name: fqdn.to_string(),
                            rtype: rtype.to_string(),
                            reason: code.to_string(),
                            extended: Some(ede.to_string()),
                        });
                    }
                }
                Err(LookupError::ResponseCode {
                    name: fqdn.to_string(),
                    rtype: rtype.to_string(),
                    code: code.to_string(),
                })
            }
            Failure::Rcode(_) => Ok(Vec::new()),
            Failure::Timeout => Err(LookupError::Timeout {
                name: fqdn.to_string(),
                rtype: rtype.to_string(),
                secs: self.timeout.as_secs(),
            }),
            Failure::Other(message) if is_dnssec_failure(&message) => {
                let extended = self
                    .extended_error(query_name, rtype)
                    .await
                    .map(|ede| ede.to_string());
                Err(LookupError::Bogus {
                    name: fqdn.to_string(),
                    rtype: rtype.to_string(),
                    reason: message,
                    extended,
                })
            }
            Failure::Other(message) => Err(LookupError::Resolution {
                name: fqdn.to_string(),
                rtype: rtype.to_string(),
                message,
            }),
        }
    }

    async fn extended_error(&self, query_name: &Name, rtype: RecordType) -> Option<ExtendedError> {
        match &self.extended {
            Some(source) => source.extended_error(query_name, rtype).await,
            None => None,
        }
    }
}

fn is_dnssec_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    DNSSEC_FAILURE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[async_trait]
impl DnsResolver for ValidatingResolver {
    async fn lookup(&self, name: &str, rtype: RecordType) -> Result<Vec<Record>, LookupError> {
        let fqdn = to_fqdn(name);
        let query_name = Name::from_ascii(&fqdn).map_err(|e| LookupError::InvalidName {
            name: fqdn.clone(),
            message: e.to_string(),
        })?;

        debug!("Resolving {fqdn}/{rtype}");
        let outcome =
            tokio::time::timeout(self.timeout, self.resolver.lookup(query_name.clone(), rtype))
                .await;

        match outcome {
            Ok(Ok(lookup)) => Ok(lookup.records().to_vec()),
            Ok(Err(err)) => {
                let result = self
                    .classify(&fqdn, &query_name, rtype, Failure::from(&err))
                    .await;
                if let Err(e) = &result {
                    debug!("Lookup of {fqdn}/{rtype} failed: {e}");
                }
                result
            }
            Err(_) => {
                warn!(
                    "Lookup of {fqdn}/{rtype} exceeded {}s",
                    self.timeout.as_secs()
                );
                Err(LookupError::Timeout {
                    name: fqdn,
                    rtype: rtype.to_string(),
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}
