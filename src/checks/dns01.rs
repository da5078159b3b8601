//! dns-01 specific checks.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::proto::rr::{RData, RecordType};

use crate::checker::Checker;
use crate::config::ACME_CHALLENGE_LABEL;
use crate::context::ScanContext;
use crate::dns::txt_strings;
use crate::domain::{registered_domain, strip_wildcard};
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::{Problem, Severity};

/// Wildcard names can only be validated with dns-01.
pub struct WildcardDns01OnlyChecker;

#[async_trait]
impl Checker for WildcardDns01OnlyChecker {
    fn name(&self) -> &'static str {
        "wildcardDNS01Only"
    }

    async fn check(
        &self,
        _ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        if !strip_wildcard(domain).1 || *method == ValidationMethod::Dns01 {
            return Err(CheckError::NotApplicable);
        }
        Ok(vec![Problem::new(
            "MethodNotSuitable",
            format!(
                "A wildcard domain like {domain} can only be issued using a dns-01 validation method."
            ),
            format!("Invalid method: {method}"),
            Severity::Fatal,
        )])
    }
}

/// Any resolver error on the challenge record fails issuance.
pub struct TxtRecordChecker;

#[async_trait]
impl Checker for TxtRecordChecker {
    fn name(&self) -> &'static str {
        "txtRecord"
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
        match ctx
            .lookup(&format!("{ACME_CHALLENGE_LABEL}.{domain}"), RecordType::TXT)
            .await
        {
            Ok(_) => Ok(Vec::new()),
            Err(e) => Ok(vec![Problem::new(
                "TXTRecordError",
                format!(
                    "An error occurred while attempting to lookup the TXT record on {ACME_CHALLENGE_LABEL}.{domain} . \
                     Any resolver errors that the Let's Encrypt CA encounters on this record will cause certificate issuance to fail."
                ),
                e.to_string(),
                Severity::Fatal,
            )]),
        }
    }
}

/// Detects challenge records created with the zone name typed twice,
/// e.g. `_acme-challenge.www.example.org.example.org`.
pub struct TxtDoubledLabelChecker;

/// TXT answer for one name: the records as text and their sorted strings.
struct TxtAnswer {
    records: Vec<String>,
    combined: String,
}

async fn query_txt(ctx: &ScanContext, name: String) -> TxtAnswer {
    // Failures count as "nothing there"; the TXT record checker reports them
    let records = ctx.lookup(&name, RecordType::TXT).await.unwrap_or_default();
    let txt: Vec<_> = records
        .iter()
        .filter(|r| matches!(r.data(), Some(RData::TXT(_))))
        .cloned()
        .collect();

    let mut strings = txt_strings(&txt);
    strings.sort();
    TxtAnswer {
        records: txt.iter().map(ToString::to_string).collect(),
        combined: strings.join("\n"),
    }
}

#[async_trait]
impl Checker for TxtDoubledLabelChecker {
    fn name(&self) -> &'static str {
        "txtDoubledLabel"
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
        let mut variants = vec![format!("{ACME_CHALLENGE_LABEL}.{domain}.{domain}")];
        if let Some(registered) = registered_domain(domain).filter(|r| r != domain) {
            variants.push(format!("{ACME_CHALLENGE_LABEL}.{domain}.{registered}"));
        }
        let control = format!(
            "{ACME_CHALLENGE_LABEL}.rand-{:08x}.{domain}",
            rand::random::<u32>()
        );

        let (answers, control) = futures::join!(
            join_all(variants.into_iter().map(|name| query_txt(ctx, name))),
            query_txt(ctx, control)
        );

        let found: Vec<&TxtAnswer> = answers.iter().filter(|a| !a.records.is_empty()).collect();
        if found.is_empty() {
            return Ok(Vec::new());
        }

        // Identical data under a random name means a wildcard TXT record
        let distinct: HashSet<&str> = found.iter().map(|a| a.combined.as_str()).collect();
        if !control.combined.is_empty() && distinct.contains(control.combined.as_str()) {
            return Ok(Vec::new());
        }

        let records: Vec<&str> = found
            .iter()
            .flat_map(|a| a.records.iter().map(String::as_str))
            .collect();
        Ok(vec![Problem::new(
            "TXTDoubleLabel",
            "Some DNS records were found that indicate TXT records may have been incorrectly manually entered into \
             DNS editor interfaces. The correct way to enter these records is to either remove the domain from the label (so \
             enter \"_acme-challenge.www.example.org\" as \"_acme-challenge.www\") or include a period (.) at the \
             end of the label (enter \"_acme-challenge.example.org.\").",
            format!(
                "The following probably-erroneous TXT records were found:\n{}",
                records.join("\n")
            ),
            Severity::Warning,
        )])
    }
}
