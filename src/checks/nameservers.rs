//! Nameserver consistency for the dns-01 challenge record.
//!
//! Every address of every nameserver is asked directly for the
//! `_acme-challenge` TXT record. Nameservers that disagree mean the CA may see
//! a stale record, depending on which one it happens to ask.
//!
//! A probing task that panics fails the checker with
//! [`CheckError::Panicked`] instead of silently dropping that nameserver.

use std::collections::BTreeMap;
use std::net::IpAddr;

use anyhow::anyhow;
use async_trait::async_trait;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType};
use log::{debug, trace, warn};
use tokio::task::{JoinError, JoinSet};

use crate::checker::Checker;
use crate::config::ACME_CHALLENGE_LABEL;
use crate::context::ScanContext;
use crate::dns::{addresses, normalize_fqdn};
use crate::domain::strip_wildcard;
use crate::error_handling::{panic_message, CheckError};
use crate::method::ValidationMethod;
use crate::problem::{dns_lookup_failed, Problem, Severity};

const NS_OUT_OF_SYNC: &str = "NSOutOfSync";

/// Compares the challenge TXT records served by each authoritative nameserver.
pub struct NameserverConsistencyChecker;

/// Addresses of one nameserver hostname for one record type.
struct NameserverAddresses {
    hostname: String,
    result: Result<Vec<IpAddr>, String>,
}

/// TXT strings served by one nameserver address.
struct NameserverAnswer {
    hostname: String,
    address: IpAddr,
    result: Result<Vec<String>, String>,
}

#[async_trait]
impl Checker for NameserverConsistencyChecker {
    fn name(&self) -> &'static str {
        "nsOutOfSync"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if *method != ValidationMethod::Dns01 {
            return Err(CheckError::NotApplicable);
        }
        let domain = strip_wildcard(domain).0;

        let ns_records = match ctx.lookup(domain, RecordType::NS).await {
            Ok(records) => records,
            Err(e) => return Ok(vec![dns_lookup_failed(domain, "NS", e)]),
        };
        let hostnames: Vec<String> = ns_records
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::NS(ns)) => Some(normalize_fqdn(&ns.0.to_ascii())),
                _ => None,
            })
            .collect();

        // Often transient, so not worth more than a note
        if hostnames.is_empty() {
            return Ok(vec![Problem::debug(
                NS_OUT_OF_SYNC,
                "No nameservers found",
                format!("No name server records were returned for the domain: {domain}"),
            )]);
        }

        let nameservers = match resolve_nameservers(ctx, &hostnames).await {
            Ok(nameservers) => nameservers,
            Err(Stop::Note(problem)) => return Ok(vec![problem]),
            Err(Stop::Failed(e)) => return Err(e),
        };

        let challenge = format!("{ACME_CHALLENGE_LABEL}.{domain}.");
        let answers = match query_nameservers(ctx, &challenge, &nameservers).await {
            Ok(answers) => answers,
            Err(Stop::Note(problem)) => return Ok(vec![problem]),
            Err(Stop::Failed(e)) => return Err(e),
        };

        Ok(compare_answers(domain, &nameservers, &answers)
            .into_iter()
            .collect())
    }
}

/// Why probing ended before every answer was in.
enum Stop {
    /// A lookup or query failed; reported as a note
    Note(Problem),
    /// A probing task panicked or was cancelled
    Failed(CheckError),
}

fn joined<T>(outcome: Result<T, JoinError>) -> Result<T, Stop> {
    outcome.map_err(|e| {
        if e.is_panic() {
            let message = panic_message(e.into_panic());
            warn!("Nameserver probe panicked: {message}");
            Stop::Failed(CheckError::Panicked(message))
        } else {
            Stop::Failed(CheckError::Failed(anyhow!("nameserver probe was cancelled: {e}")))
        }
    })
}

/// Resolves A and AAAA for every nameserver hostname concurrently.
async fn resolve_nameservers(
    ctx: &ScanContext,
    hostnames: &[String],
) -> Result<BTreeMap<String, Vec<IpAddr>>, Stop> {
    let mut tasks = JoinSet::new();
    for rtype in [RecordType::A, RecordType::AAAA] {
        for hostname in hostnames {
            let ctx = ctx.clone();
            let hostname = hostname.clone();
            tasks.spawn(async move {
                let result = ctx
                    .lookup(&hostname, rtype)
                    .await
                    .map(|records| addresses(&records))
                    .map_err(|e| format!("Error looking up {hostname} {rtype}: {e}"));
                NameserverAddresses { hostname, result }
            });
        }
    }

    // Returning early drops the set, which aborts the remaining lookups
    let mut nameservers: BTreeMap<String, Vec<IpAddr>> = BTreeMap::new();
    while let Some(outcome) = tasks.join_next().await {
        let found = joined(outcome)?;
        let ips = found.result.map_err(|message| {
            Stop::Note(Problem::debug(
                NS_OUT_OF_SYNC,
                "Error querying name server record",
                message,
            ))
        })?;
        nameservers.entry(found.hostname).or_default().extend(ips);
    }
    for ips in nameservers.values_mut() {
        ips.sort();
    }
    Ok(nameservers)
}

/// Sends the TXT query to every nameserver address and joins the answers.
async fn query_nameservers(
    ctx: &ScanContext,
    challenge: &str,
    nameservers: &BTreeMap<String, Vec<IpAddr>>,
) -> Result<BTreeMap<(String, IpAddr), Vec<String>>, Stop> {
    let mut tasks = JoinSet::new();
    for (hostname, ips) in nameservers {
        for &address in ips {
            let direct = ctx.direct().clone();
            let hostname = hostname.clone();
            let challenge = challenge.to_string();
            tasks.spawn(async move {
                let result = match direct.query(address, &challenge, RecordType::TXT).await {
                    Ok(answer) => txt_from_answer(&challenge, answer.response_code, &answer.answers),
                    Err(e) => Err(e.to_string()),
                };
                NameserverAnswer {
                    hostname,
                    address,
                    result,
                }
            });
        }
    }

    let mut answers = BTreeMap::new();
    while let Some(outcome) = tasks.join_next().await {
        let answer = joined(outcome)?;
        trace!(
            "Nameserver {} ({}) answered {:?}",
            answer.hostname,
            answer.address,
            answer.result
        );
        let mut records = answer.result.map_err(|message| {
            Stop::Note(Problem::debug(
                NS_OUT_OF_SYNC,
                "Error querying name server record for text record",
                message,
            ))
        })?;
        records.sort();
        if answers
            .insert((answer.hostname.clone(), answer.address), records)
            .is_some()
        {
            return Err(Stop::Note(Problem::debug(
                NS_OUT_OF_SYNC,
                "Duplicate IP returned for nameserver",
                answer.hostname,
            )));
        }
    }
    Ok(answers)
}

/// Extracts TXT strings from a direct answer.
///
/// CNAMEs are not followed; they are reported as an unsupported setup.
fn txt_from_answer(
    challenge: &str,
    code: ResponseCode,
    records: &[hickory_resolver::proto::rr::Record],
) -> Result<Vec<String>, String> {
    if code != ResponseCode::NoError {
        return Err(format!("Invalid rcode: {code}"));
    }

    let mut strings = Vec::new();
    for record in records {
        match record.data() {
            Some(RData::TXT(txt)) => strings.extend(
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned()),
            ),
            Some(RData::CNAME(target)) => {
                return Err(format!(
                    "You are currently using an CNAME record on {:?} -> {:?}. \
                     This service does not support recursive CNAME queries.",
                    challenge,
                    target.0.to_ascii()
                ));
            }
            _ => return Err(format!("Invalid rrtype: {}", record.record_type())),
        }
    }
    Ok(strings)
}

/// Reports the first pair of nameserver addresses serving different records,
/// or a note when none of them serves any.
fn compare_answers(
    domain: &str,
    nameservers: &BTreeMap<String, Vec<IpAddr>>,
    answers: &BTreeMap<(String, IpAddr), Vec<String>>,
) -> Option<Problem> {
    let mut entries = answers.iter();
    let first = entries.next();
    if let Some(((first_host, first_ip), first_records)) = first {
        for ((host, ip), records) in entries {
            if records != first_records {
                debug!("Nameservers {first_host} and {host} disagree on {domain}");
                return Some(Problem::new(
                    NS_OUT_OF_SYNC,
                    "Name servers have different TXT records",
                    format!(
                        "Name server {first_host} ({first_ip}) (records: {}) has different records to {host} ({ip}) (records: {})",
                        first_records.join(", "),
                        records.join(", ")
                    ),
                    Severity::Warning,
                ));
            }
        }
    }

    if answers.values().all(Vec::is_empty) {
        let list = nameservers
            .iter()
            .map(|(host, ips)| {
                let ips: Vec<String> = ips.iter().map(ToString::to_string).collect();
                format!("{host} ({})", ips.join(","))
            })
            .collect::<Vec<_>>()
            .join("\n - ");
        return Some(Problem::debug(
            NS_OUT_OF_SYNC,
            "No TXT records for _acme-challenge",
            format!(
                "No listed nameservers on the domain {domain:?} have any TXT records for the _acme-challenge subdomain.\n\
                 This is not necessarily a problem as it could mean the acme client you are using to issue certificates is cleaning up after challenges, \
                 but may be worth noting if you are unable to issue certificates.\n\
                 Nameserver list:\n - {list}"
            ),
        ));
    }

    None
}
