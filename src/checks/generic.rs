//! Checks that need no network access: method and domain validity.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::checker::Checker;
use crate::config::TLS_SNI_DISABLED_URL;
use crate::context::ScanContext;
use crate::domain::{public_suffix, strip_wildcard};
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::{Problem, Severity};

/// Longest name the CA accepts once the wildcard prefix is removed.
const MAX_DOMAIN_LENGTH: usize = 230;

/// Rejects validation methods the engine does not recognise.
pub struct ValidMethodChecker;

#[async_trait]
impl Checker for ValidMethodChecker {
    fn name(&self) -> &'static str {
        "validMethod"
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        _domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if method.is_known() {
            return Err(CheckError::NotApplicable);
        }
        Ok(vec![invalid_method(method)])
    }
}

fn invalid_method(method: &ValidationMethod) -> Problem {
    let supported = ValidationMethod::SUPPORTED
        .iter()
        .map(ValidationMethod::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Problem::new(
        "InvalidMethod",
        format!("\"{method}\" is not a supported validation method."),
        format!("Supported methods: {supported}"),
        Severity::Fatal,
    )
}

/// Reports the tls-sni methods, which the CA has switched off.
pub struct DisabledMethodChecker;

#[async_trait]
impl Checker for DisabledMethodChecker {
    fn name(&self) -> &'static str {
        "tlssni"
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        _domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if !method.is_disabled() {
            return Err(CheckError::NotApplicable);
        }
        Ok(vec![Problem::new(
            "ValidationMethodDisabled",
            format!(
                "The validation method provided ({method}) has been disabled by Let's Encrypt. \
                 For more information, please visit the url in the details."
            ),
            TLS_SNI_DISABLED_URL,
            Severity::Fatal,
        )])
    }
}

/// Ensures the name is well formed and sits under a public suffix.
pub struct ValidDomainChecker;

#[async_trait]
impl Checker for ValidDomainChecker {
    fn name(&self) -> &'static str {
        "validDomain"
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        Ok(vec![classify_domain(strip_wildcard(domain).0)])
    }
}

/// Returns either an `InvalidDomain` problem or the debug `PublicSuffix` note.
fn classify_domain(domain: &str) -> Problem {
    if let Some(c) = domain
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
    {
        return invalid_domain(domain, &format!("Invalid character present: {c}"));
    }

    if domain.len() > MAX_DOMAIN_LENGTH {
        return invalid_domain(domain, "Domain too long");
    }

    if domain.parse::<IpAddr>().is_ok() {
        return invalid_domain(domain, "Domain is an IP address");
    }

    let Some(suffix) = public_suffix(domain) else {
        return invalid_domain(domain, "Domain doesn't end in a public TLD");
    };

    if suffix == domain {
        return invalid_domain(domain, "Domain is a TLD");
    }

    Problem::debug(
        "PublicSuffix",
        "The IANA public suffix is the TLD of the Registered Domain",
        format!("The TLD for {domain} is: {suffix}"),
    )
}

fn invalid_domain(domain: &str, reason: &str) -> Problem {
    Problem::new(
        "InvalidDomain",
        format!(
            "\"{domain}\" is not a valid domain name that Let's Encrypt would be able to issue a certificate for."
        ),
        reason,
        Severity::Fatal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, StubDirect, StubResolver};
    use std::sync::Arc;

    fn ctx() -> ScanContext {
        context(Arc::new(StubResolver::new()), Arc::new(StubDirect::new()))
    }

    async fn run(checker: &dyn Checker, domain: &str, method: &str) -> Result<Vec<Problem>, CheckError> {
        checker
            .check(&ctx(), domain, &ValidationMethod::from(method))
            .await
    }

    #[tokio::test]
    async fn test_valid_method_skips_known_methods() {
        for method in ["http-01", "dns-01", "tls-sni-01"] {
            assert!(matches!(
                run(&ValidMethodChecker, "example.org", method).await,
                Err(CheckError::NotApplicable)
            ));
        }
    }

    #[tokio::test]
    async fn test_invalid_method_is_fatal() {
        let problems = run(&ValidMethodChecker, "example.org", "carrier-pigeon-01")
            .await
            .unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].name, "InvalidMethod");
        assert!(problems[0].is_fatal());
        assert_eq!(
            problems[0].explanation,
            "\"carrier-pigeon-01\" is not a supported validation method."
        );
        assert_eq!(problems[0].detail, "Supported methods: http-01, dns-01");
    }

    #[tokio::test]
    async fn test_tls_sni_is_disabled() {
        let problems = run(&DisabledMethodChecker, "example.org", "tls-sni-02")
            .await
            .unwrap();
        assert_eq!(problems[0].name, "ValidationMethodDisabled");
        assert!(problems[0].explanation.contains("(tls-sni-02)"));
        assert_eq!(problems[0].detail, TLS_SNI_DISABLED_URL);

        assert!(matches!(
            run(&DisabledMethodChecker, "example.org", "http-01").await,
            Err(CheckError::NotApplicable)
        ));
    }

    #[test]
    fn test_valid_domain_notes_public_suffix() {
        let problem = classify_domain("www.example.co.uk");
        assert_eq!(problem.name, "PublicSuffix");
        assert!(problem.is_debug());
        assert_eq!(problem.detail, "The TLD for www.example.co.uk is: co.uk");
    }

    #[test]
    fn test_invalid_domains() {
        let cases = [
            ("exa_mple.org", "Invalid character present: _"),
            ("Example.org", "Invalid character present: E"),
            ("192.168.1.1", "Domain is an IP address"),
            ("example.notarealtld", "Domain doesn't end in a public TLD"),
            ("co.uk", "Domain is a TLD"),
            ("org", "Domain is a TLD"),
        ];
        for (domain, reason) in cases {
            let problem = classify_domain(domain);
            assert_eq!(problem.name, "InvalidDomain", "{domain}");
            assert_eq!(problem.detail, reason, "{domain}");
            assert!(problem.is_fatal());
        }

        let long = format!("{}.org", "a".repeat(MAX_DOMAIN_LENGTH));
        assert_eq!(classify_domain(&long).detail, "Domain too long");
    }

    #[tokio::test]
    async fn test_valid_domain_strips_wildcard() {
        let problems = run(&ValidDomainChecker, "*.example.org", "dns-01")
            .await
            .unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].detail, "The TLD for example.org is: org");
    }
}
