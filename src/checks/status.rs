//! CA service status.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::checker::Checker;
use crate::config::{
    STATUS_API_URL, STATUS_OPERATIONAL_CODE, STATUS_PAGE_URL, STATUS_TIMEOUT_SECS,
};
use crate::context::ScanContext;
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::{Problem, Severity};

const STATUS_EXPLANATION: &str = "The current status.io status for Let's Encrypt";

#[derive(Debug, Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    status_overall: StatusOverall,
}

#[derive(Debug, Deserialize)]
struct StatusOverall {
    #[serde(default)]
    updated: String,
    status: String,
    status_code: u16,
}

/// Reports incidents shown on the CA's public status page.
///
/// An unreachable status page says nothing about the domain and is not
/// reported.
pub struct StatusIoChecker {
    url: String,
}

impl StatusIoChecker {
    /// Queries the CA's status.io page.
    pub fn new() -> Self {
        Self::with_url(STATUS_API_URL)
    }

    /// Queries a status.io compatible endpoint at `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for StatusIoChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Checker for StatusIoChecker {
    fn name(&self) -> &'static str {
        "statusio"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        _domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        let request = ctx
            .client()
            .get(&self.url)
            .timeout(Duration::from_secs(STATUS_TIMEOUT_SECS));
        let body = match request.send().await {
            Ok(response) => response.bytes().await,
            Err(e) => Err(e),
        };
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                debug!("Status page request to {} failed: {e}", self.url);
                return Ok(Vec::new());
            }
        };

        let status = match serde_json::from_slice::<StatusResponse>(&body) {
            Ok(decoded) => decoded.result.status_overall,
            Err(e) => {
                return Ok(vec![Problem::debug(
                    "StatusIO",
                    STATUS_EXPLANATION,
                    format!("Error decoding status.io api response: {e}"),
                )])
            }
        };

        let mut problems = Vec::new();
        if status.status_code != STATUS_OPERATIONAL_CODE {
            problems.push(status_not_operational(&status.status, &status.updated));
        }
        problems.push(Problem::debug("StatusIO", STATUS_EXPLANATION, status.status));
        Ok(problems)
    }
}

fn status_not_operational(status: &str, updated: &str) -> Problem {
    Problem::new(
        "StatusNotOperational",
        format!(
            "The current status as reported by the Let's Encrypt status page is {status} as at {updated}. \
             Depending on the reported problem, this may affect certificate issuance. \
             For more information, please visit the status page."
        ),
        STATUS_PAGE_URL,
        Severity::Warning,
    )
}
