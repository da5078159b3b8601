//! Emulated HTTP-01 validation requests.
//!
//! This module provides:
//! - [`check_http`]: one validation-server style request to one address
//! - [`HttpCheckResult`]: the raw outcome with its timestamped trace
//! - The redirect rules and the problems a failed request turns into
//!
//! Each probe builds its own single-shot client: no keep-alive, certificate
//! verification off, and a resolver that pins the domain under test to the
//! address being probed.

mod errors;
mod redirects;
mod resolve;
mod result;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::header::{ACCEPT, SERVER};
use reqwest::StatusCode;

use crate::config::{
    HTTP_IDLE_TIMEOUT, HTTP_TIMEOUT_SECS, MAX_BODY_SNIPPET_BYTES, VALIDATION_USER_AGENT,
};
use crate::context::ScanContext;
use crate::error_handling::error_chain;
use crate::problem::{Problem, Severity};

use errors::{translate_http_error, ProbeFailure};
use resolve::PinnedResolver;
use result::ProbeRecorder;

// Re-export public API
pub use errors::{
    a_not_working, aaaa_not_working, bad_redirect, unexpected_http_response,
    webserver_misconfiguration,
};
pub use redirects::check_redirect_target;
pub use result::HttpCheckResult;

/// Settings for emulated validation requests.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Total time allowed for one request, redirects and body included
    pub timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Port dialed for URLs that name none; `None` means the scheme default
    pub dial_port: Option<u16>,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            user_agent: VALIDATION_USER_AGENT.to_string(),
            dial_port: None,
        }
    }
}

fn build_client(
    ctx: &ScanContext,
    domain: &str,
    ip: IpAddr,
    recorder: &ProbeRecorder,
) -> Result<reqwest::Client, reqwest::Error> {
    let prober = ctx.prober();
    let resolver = PinnedResolver::new(domain, ip, prober.dial_port, ctx.clone(), recorder.clone());

    reqwest::Client::builder()
        .dns_resolver(Arc::new(resolver))
        .redirect(redirects::redirect_policy(recorder.clone()))
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .pool_idle_timeout(HTTP_IDLE_TIMEOUT)
        .no_proxy()
        .http1_only()
        .connect_timeout(prober.timeout)
        .timeout(prober.timeout)
        .user_agent(prober.user_agent.clone())
        .build()
}

/// Reads at most `limit` bytes of the body.
///
/// Whatever arrived before a read error is kept.
async fn read_limited(
    mut response: reqwest::Response,
    limit: usize,
) -> (Vec<u8>, Option<reqwest::Error>) {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => return (body, Some(e)),
        }
    }
    (body, None)
}

fn status_text(code: u16) -> String {
    StatusCode::from_u16(code)
        .map(|status| status.to_string())
        .unwrap_or_else(|_| code.to_string())
}

/// Judges a completed response against the scan options.
fn evaluate_response(
    domain: &str,
    expect: &str,
    result: &HttpCheckResult,
    read_error: Option<String>,
) -> Option<Problem> {
    let body = String::from_utf8_lossy(&result.content);

    let message = if !expect.is_empty() {
        match read_error {
            Some(e) => format!(
                "This test expected the server to respond with \"{expect}\" but instead we \
                 experienced an error reading the response: {e}"
            ),
            None if body != expect => format!(
                "This test expected the server to respond with \"{expect}\" but instead we got \
                 a response beginning with \"{body}\""
            ),
            None => return None,
        }
    } else {
        match read_error {
            Some(e) => format!("we experienced an error reading the response: {e}"),
            None => {
                // 2xx and 404 are the expected outcomes without a challenge file
                let code = result.status_code;
                if !(200..=299).contains(&code) && code != 404 {
                    return Some(unexpected_http_response(
                        domain,
                        &status_text(code),
                        &body,
                        &result.trace,
                    ));
                }
                return None;
            }
        }
    };

    Some(translate_http_error(
        domain,
        result.ip,
        ProbeFailure::Transport {
            message,
            timeout: false,
        },
        &result.trace,
    ))
}

/// Sends one validation-server style request for `domain` to `ip`.
///
/// Requests `http://{domain}/.well-known/acme-challenge/{path}` and returns
/// the raw result together with at most one problem. Network failures are
/// always reported as problems, never as errors.
pub async fn check_http(
    ctx: &ScanContext,
    domain: &str,
    ip: IpAddr,
) -> (HttpCheckResult, Option<Problem>) {
    let recorder = ProbeRecorder::new(ip);
    let options = ctx.options();
    let url = format!(
        "http://{domain}/.well-known/acme-challenge/{}",
        options.request_path()
    );
    recorder.trace(format!("Making a request to {url} (using initial IP {ip})"));

    let client = match build_client(ctx, domain, ip, &recorder) {
        Ok(client) => client,
        Err(e) => {
            return (
                recorder.snapshot(),
                Some(Problem::internal(
                    format!("Failed to construct validation request: {}", error_chain(&e)),
                    Severity::Error,
                )),
            )
        }
    };

    let response = match client.get(&url).header(ACCEPT, "*/*").send().await {
        Ok(response) => response,
        Err(e) => {
            let failure = match recorder.take_redirect_error() {
                Some(message) => ProbeFailure::Redirect(message),
                None => {
                    let message = error_chain(&e);
                    recorder.trace(format!("Experienced error: {message}"));
                    ProbeFailure::Transport {
                        message,
                        timeout: e.is_timeout(),
                    }
                }
            };
            let result = recorder.snapshot();
            debug!("Probe of {domain} via {ip} failed: {failure:?}");
            let problem = translate_http_error(domain, ip, failure, &result.trace);
            return (result, Some(problem));
        }
    };

    let server = response
        .headers()
        .get(SERVER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    recorder.observe_status(response.status(), server.as_deref());

    let expect = options.http_expect_response.as_str();
    let limit = MAX_BODY_SNIPPET_BYTES.max(expect.len() + 2);
    let (content, read_error) = read_limited(response, limit).await;
    recorder.set_content(content);

    let result = recorder.snapshot();
    debug!("Probe of {domain} via {ip}: {result}");
    let problem = evaluate_response(
        domain,
        expect,
        &result,
        read_error.map(|e| error_chain(&e)),
    );
    (result, problem)
}
