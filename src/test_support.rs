//! Stub resolvers and record builders shared by unit tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::rdata::{A, AAAA, CAA, CNAME, NS, TXT};
use hickory_resolver::proto::rr::{Name, RData, Record, RecordType};

use crate::config::ScanOptions;
use crate::context::{ScanContext, ScanResources};
use crate::dns::{normalize_fqdn, to_fqdn, DirectAnswer, DirectResolver, DnsResolver};
use crate::error_handling::LookupError;
use crate::fetch::ProberConfig;
use crate::initialization::{init_client, init_redirect_client};

fn name(n: &str) -> Name {
    Name::from_ascii(to_fqdn(n)).unwrap()
}

pub fn a_record(owner: &str, ip: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::A(A(ip.parse().unwrap())))
}

pub fn aaaa_record(owner: &str, ip: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::AAAA(AAAA(ip.parse().unwrap())))
}

pub fn txt_record(owner: &str, parts: &[&str]) -> Record {
    let txt = TXT::new(parts.iter().map(|p| p.to_string()).collect());
    Record::from_rdata(name(owner), 300, RData::TXT(txt))
}

pub fn ns_record(owner: &str, nameserver: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::NS(NS(name(nameserver))))
}

pub fn cname_record(owner: &str, target: &str) -> Record {
    Record::from_rdata(name(owner), 300, RData::CNAME(CNAME(name(target))))
}

pub fn caa_issue(owner: &str, issuer: &str, critical: bool) -> Record {
    let caa = CAA::new_issue(critical, Some(Name::from_ascii(issuer).unwrap()), vec![]);
    Record::from_rdata(name(owner), 300, RData::CAA(caa))
}

pub fn caa_issuewild(owner: &str, issuer: &str, critical: bool) -> Record {
    let caa = CAA::new_issuewild(critical, Some(Name::from_ascii(issuer).unwrap()), vec![]);
    Record::from_rdata(name(owner), 300, RData::CAA(caa))
}

/// Answers from a fixed table and counts every call.
///
/// Unknown keys resolve to an empty answer.
#[derive(Default)]
pub struct StubResolver {
    answers: HashMap<(String, RecordType), Result<Vec<Record>, LookupError>>,
    calls: AtomicUsize,
    per_key: Mutex<HashMap<(String, RecordType), usize>>,
    delay: Option<Duration>,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, owner: &str, rtype: RecordType, records: Vec<Record>) -> Self {
        self.answers
            .insert((normalize_fqdn(owner), rtype), Ok(records));
        self
    }

    pub fn with_error(mut self, owner: &str, rtype: RecordType, error: LookupError) -> Self {
        self.answers
            .insert((normalize_fqdn(owner), rtype), Err(error));
        self
    }

    /// Sleeps before answering, widening the window for concurrent callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, owner: &str, rtype: RecordType) -> usize {
        self.per_key
            .lock()
            .unwrap()
            .get(&(normalize_fqdn(owner), rtype))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl DnsResolver for StubResolver {
    async fn lookup(&self, owner: &str, rtype: RecordType) -> Result<Vec<Record>, LookupError> {
        let key = (normalize_fqdn(owner), rtype);
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_key.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers.get(&key).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Direct-query stub keyed by (server, name, type).
///
/// Unknown keys answer NOERROR with no records.
#[derive(Default)]
pub struct StubDirect {
    answers: HashMap<(IpAddr, String, RecordType), Result<DirectAnswer, LookupError>>,
    calls: AtomicUsize,
}

impl StubDirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, server: &str, owner: &str, rtype: RecordType, answers: Vec<Record>) -> Self {
        self.answers.insert(
            (server.parse().unwrap(), normalize_fqdn(owner), rtype),
            Ok(DirectAnswer {
                response_code: ResponseCode::NoError,
                answers,
            }),
        );
        self
    }

    pub fn with_error(mut self, server: &str, owner: &str, rtype: RecordType, error: LookupError) -> Self {
        self.answers
            .insert((server.parse().unwrap(), normalize_fqdn(owner), rtype), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectResolver for StubDirect {
    async fn query(
        &self,
        server: IpAddr,
        owner: &str,
        rtype: RecordType,
    ) -> Result<DirectAnswer, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(&(server, normalize_fqdn(owner), rtype))
            .cloned()
            .unwrap_or_else(|| {
                Ok(DirectAnswer {
                    response_code: ResponseCode::NoError,
                    answers: Vec::new(),
                })
            })
    }
}

pub fn resources(resolver: Arc<StubResolver>, direct: Arc<StubDirect>, prober: ProberConfig) -> ScanResources {
    let timeout = Duration::from_secs(2);
    ScanResources {
        resolver,
        direct,
        prober,
        client: Arc::new(init_client(timeout).unwrap()),
        redirect_client: Arc::new(init_redirect_client(timeout).unwrap()),
    }
}

/// Context over the given stubs with default options and prober settings.
pub fn context(resolver: Arc<StubResolver>, direct: Arc<StubDirect>) -> ScanContext {
    ScanContext::new(
        resources(resolver, direct, ProberConfig::default()),
        ScanOptions::default(),
    )
}

pub fn servfail(owner: &str, rtype: RecordType) -> LookupError {
    LookupError::ResponseCode {
        name: to_fqdn(owner),
        rtype: rtype.to_string(),
        code: ResponseCode::ServFail.to_string(),
    }
}
