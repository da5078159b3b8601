//! Redirect rules of the validation server.
//!
//! The rules are applied through reqwest's redirect hook so that a rejected
//! redirect aborts the request exactly where the validation server would.

use reqwest::redirect::{Attempt, Policy};
use url::Url;

use super::result::ProbeRecorder;
use crate::config::{ALLOWED_REDIRECT_PORTS, MAX_REDIRECT_HOPS};

fn too_many_redirects(url: &Url, previous: usize) -> String {
    format!("Too many redirects ({previous}), last redirect was to: {url}")
}

/// Checks the target of one redirect.
///
/// Returns the rejection message for a target the validation server would
/// refuse to follow.
pub fn check_redirect_target(url: &Url) -> Result<(), String> {
    if let Some(port) = url.port() {
        if !ALLOWED_REDIRECT_PORTS.contains(&port) {
            return Err(format!(
                "Bad port number provided when fetching {url}: {port}"
            ));
        }
    }

    let scheme = url.scheme().to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "Bad scheme provided when fetching {url}: {scheme}"
        ));
    }

    // domain.tld.well-known/acme-challenge/...
    if url
        .host_str()
        .map(|host| host.to_lowercase().ends_with(".well-known"))
        .unwrap_or(false)
    {
        return Err(format!(
            "It appears that a redirect was generated by your web server that is missing a \
             trailing slash after your domain name: {url}. Check your web server configuration \
             and .htaccess for Redirect/RedirectMatch/RewriteRule."
        ));
    }

    Ok(())
}

/// Builds the redirect policy for one probe.
///
/// Every redirect response is traced; a rejected redirect is also stored in
/// the recorder so it can replace reqwest's generic error text.
pub(crate) fn redirect_policy(recorder: ProbeRecorder) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        recorder.observe_status(attempt.status(), None);
        recorder.count_redirect();

        let previous = attempt.previous().len();
        let verdict = if previous >= MAX_REDIRECT_HOPS {
            Err(too_many_redirects(attempt.url(), previous))
        } else {
            recorder.trace(format!("Received redirect to {}", attempt.url()));
            check_redirect_target(attempt.url())
        };

        match verdict {
            Ok(()) => attempt.follow(),
            Err(message) => {
                recorder.set_redirect_error(message.clone());
                attempt.error(message)
            }
        }
    })
}
