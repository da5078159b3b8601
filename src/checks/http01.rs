//! http-01 specific checks.

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::proto::rr::RecordType;

use crate::checker::Checker;
use crate::context::ScanContext;
use crate::dns::{addresses, format_records};
use crate::error_handling::CheckError;
use crate::fetch::{check_http, HttpCheckResult};
use crate::method::ValidationMethod;
use crate::problem::{dns_lookup_failed, Problem, Severity};
use crate::security::is_address_reserved;

/// Checks that the validating resolver can resolve A and AAAA for the domain
/// and that the addresses are publicly routable.
pub struct DnsAChecker;

#[async_trait]
impl Checker for DnsAChecker {
    fn name(&self) -> &'static str {
        "dnsA"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if *method != ValidationMethod::Http01 {
            return Err(CheckError::NotApplicable);
        }

        let (aaaa, a) = futures::join!(
            ctx.lookup(domain, RecordType::AAAA),
            ctx.lookup(domain, RecordType::A)
        );

        let mut problems = Vec::new();
        let a = a.unwrap_or_else(|e| {
            problems.push(dns_lookup_failed(domain, "A", e));
            Vec::new()
        });
        let aaaa = aaaa.unwrap_or_else(|e| {
            problems.push(dns_lookup_failed(domain, "AAAA", e));
            Vec::new()
        });

        let records: Vec<_> = a.into_iter().chain(aaaa).collect();
        for ip in addresses(&records) {
            if is_address_reserved(ip) {
                problems.push(reserved_address(domain, &ip.to_string()));
            }
        }

        if addresses(&records).is_empty() {
            problems.push(no_records(domain, "No A or AAAA records found."));
        } else {
            problems.push(Problem::debug(
                "HTTPRecords",
                "A and AAAA records found for this domain",
                format_records(&records),
            ));
        }

        Ok(problems)
    }
}

fn no_records(name: &str, summary: &str) -> Problem {
    Problem::new(
        "NoRecords",
        format!(
            "No valid A or AAAA records could be ultimately resolved for {name}. \
             This means that Let's Encrypt would not be able to to connect to your domain to perform HTTP validation, \
             since it would not know where to connect to."
        ),
        summary,
        Severity::Fatal,
    )
}

fn reserved_address(name: &str, address: &str) -> Problem {
    Problem::new(
        "ReservedAddress",
        format!(
            "A private, inaccessible, IANA/IETF-reserved IP address was found for {name}. \
             Let's Encrypt will always fail HTTP validation for any domain that is pointing to an address that is not routable on the internet. \
             You should either remove this address and replace it with a public one or use the DNS validation method instead."
        ),
        address,
        Severity::Fatal,
    )
}

/// Sends a validation-style request to every address of the domain.
pub struct HttpAccessibilityChecker;

#[async_trait]
impl Checker for HttpAccessibilityChecker {
    fn name(&self) -> &'static str {
        "httpAccessibility"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if *method != ValidationMethod::Http01 {
            return Err(CheckError::NotApplicable);
        }

        // Lookup failures were already reported by the A/AAAA checker
        let mut ips = Vec::new();
        for rtype in [RecordType::AAAA, RecordType::A] {
            if let Ok(records) = ctx.lookup(domain, rtype).await {
                ips.extend(addresses(&records));
            }
        }
        if ips.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = join_all(ips.iter().map(|&ip| check_http(ctx, domain, ip))).await;

        let mut problems = Vec::new();
        let mut requests = Vec::with_capacity(outcomes.len());
        for (result, problem) in &outcomes {
            requests.push(format!(
                "Request to: {domain}/{}, Result: {result}, Issue: {}",
                result.ip,
                problem.as_ref().map(|p| p.name.as_str()).unwrap_or_default()
            ));
            if let Some(problem) = problem {
                problems.push(problem.clone());
            }
        }

        let answered = |v4: bool| {
            outcomes
                .iter()
                .map(|(result, _)| result)
                .find(|result| result.ip.is_ipv4() == v4 && !result.is_zero())
        };
        if let (Some(v4), Some(v6)) = (answered(true), answered(false)) {
            if v4.status_code != v6.status_code || v4.server_header != v6.server_header {
                problems.push(v4_v6_discrepancy(domain, v4, v6));
            }
        }

        problems.push(Problem::debug(
            "HTTPCheck",
            "Requests made to the domain",
            requests.join("\n"),
        ));
        Ok(problems)
    }
}

fn v4_v6_discrepancy(domain: &str, v4: &HttpCheckResult, v6: &HttpCheckResult) -> Problem {
    Problem::new(
        "IPv4IPv6Discrepancy",
        format!(
            "{domain} has both AAAA (IPv6) and A (IPv4) records. While they both appear to be accessible on the network, \
             we have detected that they produce differing results when sent an ACME HTTP validation request. \
             This may indicate that the IPv4 and IPv6 addresses may unintentionally point to different servers, \
             which would cause validation to fail."
        ),
        format!("{v4} vs {v6}"),
        Severity::Warning,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanOptions;
    use crate::fetch::ProberConfig;
    use crate::test_support::{a_record, aaaa_record, context, resources, servfail, StubDirect, StubResolver};
    use axum::http::header::SERVER;
    use axum::Router;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn ctx(resolver: StubResolver) -> ScanContext {
        context(Arc::new(resolver), Arc::new(StubDirect::new()))
    }

    #[tokio::test]
    async fn test_records_are_listed() {
        let ctx = ctx(StubResolver::new()
            .with("example.org", RecordType::A, vec![a_record("example.org", "93.184.216.34")])
            .with(
                "example.org",
                RecordType::AAAA,
                vec![aaaa_record("example.org", "2606:2800:220:1:248:1893:25c8:1946")],
            ));

        let problems = DnsAChecker
            .check(&ctx, "example.org", &ValidationMethod::Http01)
            .await
            .unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].name, "HTTPRecords");
        assert!(problems[0].detail.contains("93.184.216.34"));
        assert!(problems[0].detail.contains("2606:2800:220:1:248:1893:25c8:1946"));
    }

    #[tokio::test]
    async fn test_reserved_address_is_fatal() {
        let ctx = ctx(StubResolver::new().with(
            "example.org",
            RecordType::A,
            vec![a_record("example.org", "192.168.1.10")],
        ));

        let problems = DnsAChecker
            .check(&ctx, "example.org", &ValidationMethod::Http01)
            .await
            .unwrap();
        let reserved: Vec<_> = problems.iter().filter(|p| p.name == "ReservedAddress").collect();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].detail, "192.168.1.10");
        assert!(reserved[0].is_fatal());
    }

    #[tokio::test]
    async fn test_no_records_and_lookup_failures() {
        let ctx = ctx(StubResolver::new().with_error(
            "example.org",
            RecordType::AAAA,
            servfail("example.org", RecordType::AAAA),
        ));

        let problems = DnsAChecker
            .check(&ctx, "example.org", &ValidationMethod::Http01)
            .await
            .unwrap();
        let names: Vec<_> = problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["DNSLookupFailed", "NoRecords"]);
        assert!(problems[0].explanation.contains("example.org/AAAA"));
        assert_eq!(problems[1].detail, "No A or AAAA records found.");
    }

    #[tokio::test]
    async fn test_http_checkers_skip_dns01() {
        let ctx = ctx(StubResolver::new());
        for checker in [&DnsAChecker as &dyn Checker, &HttpAccessibilityChecker] {
            assert!(matches!(
                checker.check(&ctx, "example.org", &ValidationMethod::Dns01).await,
                Err(CheckError::NotApplicable)
            ));
        }
    }

    #[tokio::test]
    async fn test_accessibility_without_addresses_is_silent() {
        let ctx = ctx(StubResolver::new());
        let problems = HttpAccessibilityChecker
            .check(&ctx, "example.org", &ValidationMethod::Http01)
            .await
            .unwrap();
        assert!(problems.is_empty());
    }

    #[tokio::test]
    async fn test_accessibility_reports_each_request() {
        let app = Router::new().fallback(|| async { ([(SERVER, "v4-server")], "ok") });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let resolver = StubResolver::new().with(
            "example.test",
            RecordType::A,
            vec![a_record("example.test", "127.0.0.1")],
        );
        let prober = ProberConfig {
            timeout: Duration::from_secs(5),
            dial_port: Some(port),
            ..Default::default()
        };
        let ctx = ScanContext::new(
            resources(Arc::new(resolver), Arc::new(StubDirect::new()), prober),
            ScanOptions::default(),
        );

        let problems = HttpAccessibilityChecker
            .check(&ctx, "example.test", &ValidationMethod::Http01)
            .await
            .unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].name, "HTTPCheck");
        assert!(problems[0]
            .detail
            .starts_with("Request to: example.test/127.0.0.1, Result: [Address=127.0.0.1,Address Type=IPv4,Server=v4-server,HTTP Status=200]"));
    }

    #[test]
    fn test_discrepancy_detail() {
        let mut v4 = HttpCheckResult::new("192.0.2.1".parse().unwrap());
        v4.status_code = 200;
        v4.initial_status_code = 200;
        let mut v6 = HttpCheckResult::new("2001:db8::1".parse().unwrap());
        v6.status_code = 404;
        v6.initial_status_code = 404;

        let problem = v4_v6_discrepancy("example.org", &v4, &v6);
        assert_eq!(problem.severity, Severity::Warning);
        assert_eq!(
            problem.detail,
            "[Address=192.0.2.1,Address Type=IPv4,Server=,HTTP Status=200] vs \
             [Address=2001:db8::1,Address Type=IPv6,Server=,HTTP Status=404]"
        );
    }
}
