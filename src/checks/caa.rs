//! CAA policy evaluation.
//!
//! The CA looks for CAA records at the requested name and, if there are none,
//! at each parent in turn. The first name that has any CAA record decides.

use async_trait::async_trait;
use hickory_resolver::proto::rr::RecordType;
use log::debug;

use crate::checker::Checker;
use crate::config::CA_ISSUER_DOMAIN;
use crate::context::ScanContext;
use crate::dns::CaaRecord;
use crate::domain::{parent_domain, registered_domain, strip_wildcard};
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::{dns_lookup_failed, Problem, Severity};

/// Walks the CAA tree from the requested name up to the registered domain.
pub struct CaaChecker;

#[async_trait]
impl Checker for CaaChecker {
    fn name(&self) -> &'static str {
        "caa"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        let (mut current, wildcard) = strip_wildcard(domain);
        let apex = registered_domain(current);

        loop {
            let records = match ctx.lookup(current, RecordType::CAA).await {
                Ok(records) => records,
                Err(e) => return Ok(vec![dns_lookup_failed(current, "CAA", e)]),
            };

            let caa = CaaRecord::from_records(&records);
            if !caa.is_empty() {
                debug!("Found {} CAA record(s) at {current}", caa.len());
                return Ok(evaluate_caa(current, wildcard, &caa));
            }

            // Ends at the registered domain; the public suffix itself is never queried
            if apex.as_deref().map_or(true, |apex| apex == current) {
                return Ok(Vec::new());
            }
            match parent_domain(current) {
                Some(parent) => current = parent,
                None => return Ok(Vec::new()),
            }
        }
    }
}

/// Decides whether the CAA record set found at `domain` permits issuance.
///
/// Returns a debug `CAA` note listing the `issue` and `issuewild` records,
/// followed by at most one fatal problem.
pub fn evaluate_caa(domain: &str, wildcard: bool, records: &[CaaRecord]) -> Vec<Problem> {
    let issue: Vec<&CaaRecord> = records.iter().filter(|r| r.is_issue()).collect();
    let issuewild: Vec<&CaaRecord> = records.iter().filter(|r| r.is_issuewild()).collect();
    let listed: Vec<&CaaRecord> = issue.iter().chain(issuewild.iter()).copied().collect();
    let mut problems = vec![Problem::debug(
        "CAA",
        "CAA records control authorization for certificate authorities to issue certificates for a domain",
        collate(&listed),
    )];

    let critical_unknown: Vec<&CaaRecord> =
        records.iter().filter(|r| r.is_critical_unknown()).collect();
    if !critical_unknown.is_empty() {
        problems.push(Problem::new(
            "CAACriticalUnknown",
            format!(
                "CAA record(s) exist on {domain} (wildcard={wildcard}) that are marked as critical but are unknown to Let's Encrypt. \
                 These record(s) as shown in the detail must be removed, or marked as non-critical, before a certificate can be issued by the Let's Encrypt CA."
            ),
            collate(&critical_unknown),
            Severity::Fatal,
        ));
        return problems;
    }

    let selected = if wildcard && !issuewild.is_empty() {
        issuewild
    } else {
        issue
    };

    // Only iodef (or an empty issuer set) places no restriction
    if selected.is_empty()
        || selected
            .iter()
            .any(|r| r.issuer.as_deref() == Some(CA_ISSUER_DOMAIN))
    {
        return problems;
    }

    problems.push(Problem::new(
        "CAAIssuanceNotAllowed",
        format!(
            "No CAA record on {domain} (wildcard={wildcard}) contains the issuance domain \"{CA_ISSUER_DOMAIN}\". \
             You must either add an additional record to include \"{CA_ISSUER_DOMAIN}\" or remove every existing CAA record. \
             A list of the CAA records are provided in the details."
        ),
        collate(&selected),
        Severity::Fatal,
    ));
    problems
}

fn collate(records: &[&CaaRecord]) -> String {
    records
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
