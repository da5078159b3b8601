//! Translation of probe failures into problems.

use std::net::IpAddr;

use crate::problem::{Problem, Severity};

/// Why an emulated request did not produce an acceptable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProbeFailure {
    /// A redirect the validation server would refuse to follow
    Redirect(String),
    /// Connection, protocol or body errors
    Transport { message: String, timeout: bool },
}

fn with_trace(message: &str, trace: &[String]) -> String {
    format!("{message}\n\nTrace:\n{}", trace.join("\n"))
}

fn is_protocol_mismatch(message: &str) -> bool {
    message.contains("HTTP response to HTTPS") || message.contains("wrong version number")
}

pub(crate) fn translate_http_error(
    domain: &str,
    ip: IpAddr,
    failure: ProbeFailure,
    trace: &[String],
) -> Problem {
    let (message, timeout) = match failure {
        ProbeFailure::Redirect(message) => return bad_redirect(domain, &message, trace),
        ProbeFailure::Transport { message, timeout } => (message, timeout),
    };

    if is_protocol_mismatch(&message) {
        return webserver_misconfiguration(
            domain,
            &with_trace(
                &format!(
                    "Web server is serving the wrong protocol on the wrong port: {message}. \
                     This may be due to a previous HTTP redirect rather than a webserver \
                     misconfiguration."
                ),
                trace,
            ),
        );
    }

    let message = if timeout {
        format!("A timeout was experienced while communicating with {domain}/{ip}: {message}")
    } else {
        message
    };

    match ip {
        IpAddr::V6(_) => aaaa_not_working(domain, ip, &message, trace),
        IpAddr::V4(_) => a_not_working(domain, ip, &message, trace),
    }
}

/// The server answered plain HTTP with TLS, or the other way round.
pub fn webserver_misconfiguration(domain: &str, detail: &str) -> Problem {
    Problem::new(
        "WebserverMisconfiguration",
        format!("{domain}'s webserver may be misconfigured."),
        detail,
        Severity::Error,
    )
}

/// A request to an IPv6 address failed.
pub fn aaaa_not_working(domain: &str, ip: IpAddr, message: &str, trace: &[String]) -> Problem {
    Problem::new(
        "AAAANotWorking",
        format!(
            "{domain} has an AAAA (IPv6) record ({ip}) but a test request to this address over \
             port 80 did not succeed. Your web server must have at least one working IPv4 or \
             IPv6 address. You should either ensure that validation requests to this domain \
             succeed over IPv6, or remove its AAAA record."
        ),
        with_trace(message, trace),
        Severity::Error,
    )
}

/// A request to an IPv4 address failed.
pub fn a_not_working(domain: &str, ip: IpAddr, message: &str, trace: &[String]) -> Problem {
    Problem::new(
        "ANotWorking",
        format!(
            "{domain} has an A (IPv4) record ({ip}) but a request to this address over port 80 \
             did not succeed. Your web server must have at least one working IPv4 or IPv6 \
             address."
        ),
        with_trace(message, trace),
        Severity::Error,
    )
}

/// A redirect broke one of the validation server's rules.
pub fn bad_redirect(domain: &str, message: &str, trace: &[String]) -> Problem {
    Problem::new(
        "BadRedirect",
        format!(
            "Sending an ACME HTTP validation request to {domain} results in an unacceptable \
             redirect. This is most likely a misconfiguration of your web server or your web \
             application."
        ),
        with_trace(message, trace),
        Severity::Error,
    )
}

/// A final status other than 2xx or 404.
pub fn unexpected_http_response(domain: &str, status: &str, body: &str, trace: &[String]) -> Problem {
    Problem::new(
        "UnexpectedHttpResponse",
        format!(
            "Sending an ACME HTTP validation request to {domain} results in unexpected HTTP \
             response {status}. This indicates that the webserver is misconfigured or \
             misbehaving."
        ),
        format!("{status}\n\n{body}\n\nTrace:\n{}", trace.join("\n")),
        Severity::Warning,
    )
}
