//! End-to-end scans through the public `Engine` API.
//!
//! DNS is served from in-memory tables, so these tests never touch the
//! network. The Cloudflare and status page checkers are left out of the
//! checker list because they make real HTTP requests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::rdata::{A, CAA, TXT};
use hickory_resolver::proto::rr::{Name, RData, Record, RecordType};

use acme_precheck::checks::default_checkers;
use acme_precheck::dns::{normalize_fqdn, DirectAnswer, DirectResolver, DnsResolver};
use acme_precheck::fetch::ProberConfig;
use acme_precheck::{
    has_fatal, CheckError, Checker, Engine, LookupError, Problem, ScanContext, ScanError,
    ScanOptions, Severity, ValidationMethod,
};

#[derive(Default)]
struct TableResolver {
    records: HashMap<(String, RecordType), Vec<Record>>,
    queries: Mutex<Vec<(String, RecordType)>>,
}

impl TableResolver {
    fn with(mut self, owner: &str, rtype: RecordType, rdata: RData) -> Self {
        let name = Name::from_ascii(format!("{owner}.")).unwrap();
        self.records
            .entry((owner.to_string(), rtype))
            .or_default()
            .push(Record::from_rdata(name, 300, rdata));
        self
    }

    fn queried(&self, rtype: RecordType) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| *t == rtype)
            .count()
    }

    fn queried_key(&self, owner: &str, rtype: RecordType) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, t)| n == owner && *t == rtype)
            .count()
    }
}

#[async_trait]
impl DnsResolver for TableResolver {
    async fn lookup(&self, name: &str, rtype: RecordType) -> Result<Vec<Record>, LookupError> {
        let name = normalize_fqdn(name);
        self.queries.lock().unwrap().push((name.clone(), rtype));
        Ok(self.records.get(&(name, rtype)).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct SilentNameservers {
    queries: AtomicUsize,
}

#[async_trait]
impl DirectResolver for SilentNameservers {
    async fn query(
        &self,
        _server: IpAddr,
        _name: &str,
        _rtype: RecordType,
    ) -> Result<DirectAnswer, LookupError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(DirectAnswer {
            response_code: ResponseCode::NoError,
            answers: Vec::new(),
        })
    }
}

fn offline_checkers() -> Vec<Arc<dyn Checker>> {
    default_checkers()
        .into_iter()
        .filter(|checker| !matches!(checker.name(), "cloudflare" | "statusio"))
        .collect()
}

fn engine(resolver: Arc<TableResolver>) -> Engine {
    Engine::with_parts(
        resolver,
        Arc::new(SilentNameservers::default()),
        ProberConfig::default(),
        offline_checkers(),
    )
    .unwrap()
}

fn names(problems: &[Problem]) -> Vec<&str> {
    problems.iter().map(|p| p.name.as_str()).collect()
}

fn caa_issue(issuer: &str) -> RData {
    RData::CAA(CAA::new_issue(false, Some(Name::from_ascii(issuer).unwrap()), vec![]))
}

#[tokio::test]
async fn test_wildcard_with_http01_stops_before_dns() {
    let resolver = Arc::new(TableResolver::default());
    let engine = engine(resolver.clone());

    let problems = engine
        .check("*.example.org", ValidationMethod::Http01, ScanOptions::default())
        .await
        .unwrap();

    assert_eq!(names(&problems), vec!["PublicSuffix", "MethodNotSuitable"]);
    assert!(has_fatal(&problems));
    assert!(resolver.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_caa_denial_stops_before_challenge_checks() {
    let resolver = Arc::new(TableResolver::default().with(
        "example.org",
        RecordType::CAA,
        caa_issue("othertrustca.com"),
    ));
    let engine = engine(resolver.clone());

    let problems = engine
        .check("sub.example.org", ValidationMethod::Dns01, ScanOptions::default())
        .await
        .unwrap();

    assert_eq!(
        names(&problems),
        vec!["PublicSuffix", "CAA", "CAAIssuanceNotAllowed"]
    );
    assert_eq!(resolver.queried(RecordType::TXT), 0);
}

#[tokio::test]
async fn test_healthy_dns01_scan() {
    let resolver = Arc::new(
        TableResolver::default()
            .with("example.org", RecordType::CAA, caa_issue("letsencrypt.org"))
            .with(
                "_acme-challenge.example.org",
                RecordType::TXT,
                RData::TXT(TXT::new(vec!["token".to_string()])),
            ),
    );
    let engine = engine(resolver.clone());

    let problems = engine
        .check("Example.ORG.", ValidationMethod::Dns01, ScanOptions::default())
        .await
        .unwrap();

    // Only notes: the public suffix and the missing NS records
    assert!(problems.iter().all(Problem::is_debug), "{problems:?}");
    assert!(names(&problems).contains(&"NSOutOfSync"));
    assert_eq!(resolver.queried_key("_acme-challenge.example.org", RecordType::TXT), 1);
}

#[tokio::test]
async fn test_reserved_address_is_fatal_for_http01() {
    let resolver = Arc::new(TableResolver::default().with(
        "example.org",
        RecordType::A,
        RData::A(A("10.0.0.1".parse().unwrap())),
    ));
    let engine = engine(resolver.clone());

    let problems = engine
        .check("example.org", ValidationMethod::Http01, ScanOptions::default())
        .await
        .unwrap();

    let reserved: Vec<_> = problems
        .iter()
        .filter(|p| p.name == "ReservedAddress")
        .collect();
    assert_eq!(reserved.len(), 1);
    assert_eq!(reserved[0].severity, Severity::Fatal);
    assert!(!names(&problems).contains(&"HTTPCheck"));
    // One lookup per type, shared by the checkers that asked for it
    assert_eq!(resolver.queried_key("example.org", RecordType::A), 1);
}

#[tokio::test]
async fn test_concurrent_scans_do_not_share_a_cache() {
    let resolver = Arc::new(TableResolver::default());
    let engine = engine(resolver.clone());

    let (first, second) = tokio::join!(
        engine.check("example.org", ValidationMethod::Dns01, ScanOptions::default()),
        engine.check("example.org", ValidationMethod::Dns01, ScanOptions::default()),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(resolver.queried_key("example.org", RecordType::CAA), 2);
}

struct Exploding;

#[async_trait]
impl Checker for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        _domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        panic!("index out of bounds");
    }
}

#[tokio::test]
async fn test_panicking_checker_is_a_scan_error() {
    let engine = Engine::with_parts(
        Arc::new(TableResolver::default()),
        Arc::new(SilentNameservers::default()),
        ProberConfig::default(),
        vec![Arc::new(Exploding) as Arc<dyn Checker>],
    )
    .unwrap();

    let result = engine
        .check("example.org", ValidationMethod::Http01, ScanOptions::default())
        .await;

    assert!(matches!(result, Err(ScanError::Panicked(message)) if message.contains("index out of bounds")));
}
