//! Cloudflare CDN detection.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, SERVER};

use crate::checker::Checker;
use crate::context::ScanContext;
use crate::domain::strip_wildcard;
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::{Problem, Severity};

const SSL_OPTIONS_URL: &str =
    "https://support.cloudflare.com/hc/en-us/articles/200170416-What-do-the-SSL-options-mean-";
const SSL_ACTIVATION_URL: &str =
    "https://support.cloudflare.com/hc/en-us/articles/203045244-How-long-does-it-take-for-Cloudflare-s-SSL-to-activate-";

/// Notices domains proxied by Cloudflare, and whether Cloudflare has a
/// certificate for them yet.
///
/// Network failures say nothing about Cloudflare and are not reported.
pub struct CloudflareChecker;

#[async_trait]
impl Checker for CloudflareChecker {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        _method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        let domain = strip_wildcard(domain).0;

        // A successful TLS handshake means a certificate is already in place
        match ctx.client().get(format!("https://{domain}")).send().await {
            Ok(response) => {
                if has_cloudflare_header(response.headers()) {
                    return Ok(vec![cloudflare_cdn(domain)]);
                }
                return Ok(Vec::new());
            }
            Err(e) => debug!("HTTPS request to {domain} failed: {e}"),
        }

        match ctx
            .redirect_client()
            .get(format!("http://{domain}"))
            .send()
            .await
        {
            Ok(response) if has_cloudflare_header(response.headers()) => Ok(vec![
                cloudflare_cdn(domain),
                cloudflare_ssl_not_provisioned(domain),
            ]),
            Ok(_) => Ok(Vec::new()),
            Err(e) => {
                debug!("HTTP request to {domain} failed: {e}");
                Ok(Vec::new())
            }
        }
    }
}

fn has_cloudflare_header(headers: &HeaderMap) -> bool {
    headers
        .get(SERVER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|server| server.to_lowercase().contains("cloudflare"))
}

fn cloudflare_cdn(domain: &str) -> Problem {
    Problem::new(
        "CloudflareCDN",
        format!(
            "The domain {domain} is being served through Cloudflare CDN. Any Let's Encrypt certificate installed on the \
             origin server will only encrypt traffic between the server and Cloudflare. \
             It is strongly recommended that the SSL option 'Full SSL (strict)' be enabled."
        ),
        SSL_OPTIONS_URL,
        Severity::Warning,
    )
}

fn cloudflare_ssl_not_provisioned(domain: &str) -> Problem {
    Problem::new(
        "CloudflareSSLNotProvisioned",
        format!(
            "The domain {domain} is being served through Cloudflare CDN and a certificate has not yet been provisioned yet by Cloudflare."
        ),
        SSL_ACTIVATION_URL,
        Severity::Warning,
    )
}
