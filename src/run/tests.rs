// Orchestration tests.

use super::*;
use crate::error_handling::ConfigError;
use crate::fetch::ProberConfig;
use crate::problem::Severity;
use crate::test_support::{StubDirect, StubResolver};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What a spy checker does when called.
#[derive(Clone)]
enum Behaviour {
    Report(Vec<Problem>),
    NotApplicable,
    Fail,
    Panic,
}

struct Spy {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
    seen_domains: Mutex<Vec<String>>,
}

impl Spy {
    fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
            seen_domains: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Checker for Spy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_domains.lock().unwrap().push(domain.to_string());
        match &self.behaviour {
            Behaviour::Report(problems) => Ok(problems.clone()),
            Behaviour::NotApplicable => Err(CheckError::NotApplicable),
            Behaviour::Fail => Err(CheckError::Failed(anyhow!("resolver unreachable"))),
            Behaviour::Panic => panic!("checker blew up"),
        }
    }
}

fn problem(name: &str, severity: Severity) -> Problem {
    Problem::new(name, "explanation", "detail", severity)
}

fn engine(spies: Vec<Arc<Spy>>) -> Engine {
    let checkers = spies
        .into_iter()
        .map(|spy| spy as Arc<dyn Checker>)
        .collect();
    Engine::with_parts(
        Arc::new(StubResolver::new()),
        Arc::new(StubDirect::new()),
        ProberConfig::default(),
        checkers,
    )
    .unwrap()
}

async fn scan(engine: &Engine) -> Result<Vec<Problem>, ScanError> {
    engine
        .check("example.org", ValidationMethod::Http01, ScanOptions::default())
        .await
}

#[tokio::test]
async fn test_fatal_problem_stops_the_scan() {
    let first = Spy::new("first", Behaviour::Report(vec![problem("Note", Severity::Warning)]));
    let fatal = Spy::new("fatal", Behaviour::Report(vec![problem("Stop", Severity::Fatal)]));
    let never = Spy::new("never", Behaviour::Report(vec![problem("Late", Severity::Error)]));
    let engine = engine(vec![first.clone(), fatal.clone(), never.clone()]);

    let problems = scan(&engine).await.unwrap();

    let names: Vec<_> = problems.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Note", "Stop"]);
    assert_eq!(first.calls(), 1);
    assert_eq!(fatal.calls(), 1);
    assert_eq!(never.calls(), 0);
}

#[tokio::test]
async fn test_not_applicable_is_invisible() {
    let skipped = Spy::new("skipped", Behaviour::NotApplicable);
    let after = Spy::new("after", Behaviour::Report(vec![problem("Seen", Severity::Info)]));
    let engine = engine(vec![skipped.clone(), after.clone()]);

    let problems = scan(&engine).await.unwrap();

    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].name, "Seen");
    assert_eq!(skipped.calls(), 1);
    assert_eq!(after.calls(), 1);
}

#[tokio::test]
async fn test_checker_failure_aborts_the_scan() {
    let failing = Spy::new("failing", Behaviour::Fail);
    let after = Spy::new("after", Behaviour::Report(Vec::new()));
    let engine = engine(vec![failing, after.clone()]);

    let err = scan(&engine).await.unwrap_err();

    match err {
        ScanError::Checker { checker, source } => {
            assert_eq!(checker, "failing");
            assert!(source.to_string().contains("resolver unreachable"));
        }
        other => panic!("expected a checker error, got {other:?}"),
    }
    assert_eq!(after.calls(), 0);
}

#[tokio::test]
async fn test_panic_becomes_scan_error() {
    let engine = engine(vec![Spy::new("panicking", Behaviour::Panic)]);

    let err = scan(&engine).await.unwrap_err();

    match err {
        ScanError::Panicked(message) => assert!(message.contains("checker blew up")),
        other => panic!("expected a panic error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_domain_is_normalized_once() {
    let spy = Spy::new("spy", Behaviour::Report(Vec::new()));
    let engine = engine(vec![spy.clone()]);

    engine
        .check("  WWW.Example.ORG. ", ValidationMethod::Dns01, ScanOptions::default())
        .await
        .unwrap();

    assert_eq!(*spy.seen_domains.lock().unwrap(), vec!["www.example.org"]);
}

#[tokio::test]
async fn test_empty_problems_are_dropped() {
    let spy = Spy::new(
        "spy",
        Behaviour::Report(vec![
            Problem::new("", "", "", Severity::Debug),
            problem("Real", Severity::Warning),
        ]),
    );
    let engine = engine(vec![spy]);

    let problems = scan(&engine).await.unwrap();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].name, "Real");
}

#[tokio::test]
async fn test_invalid_options_are_rejected_before_checking() {
    let spy = Spy::new("spy", Behaviour::Report(Vec::new()));
    let engine = engine(vec![spy.clone()]);
    let options = ScanOptions {
        http_request_path: "a/b".to_string(),
        ..Default::default()
    };

    let err = engine
        .check("example.org", ValidationMethod::Http01, options)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScanError::InvalidOptions(ConfigError::InvalidRequestPath(_))
    ));
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_default_engine_rejects_invalid_method_offline() {
    let engine = Engine::with_parts(
        Arc::new(StubResolver::new()),
        Arc::new(StubDirect::new()),
        ProberConfig::default(),
        crate::checks::default_checkers(),
    )
    .unwrap();

    let problems = engine
        .check(
            "example.org",
            ValidationMethod::from("tls-alpn-02"),
            ScanOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].name, "InvalidMethod");
    assert_eq!(engine.checker_names()[0], "validMethod");
}
