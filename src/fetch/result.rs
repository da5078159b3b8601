//! Probe outcome and request tracing.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use log::trace;
use reqwest::StatusCode;

/// Raw outcome of one emulated validation request.
///
/// Kept even when a problem is reported, so the A and AAAA results can be
/// compared with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCheckResult {
    /// Address the domain under test was pinned to
    pub ip: IpAddr,
    /// Status of the last response received (0 if none)
    pub status_code: u16,
    /// Status of the first response received (0 if none)
    pub initial_status_code: u16,
    /// `Server` header of the last response
    pub server_header: String,
    /// Redirects the client was asked to follow
    pub num_redirects: usize,
    /// Start of the body, truncated to the read limit
    pub content: Vec<u8>,
    /// Timestamped dial and response lines, in order
    pub trace: Vec<String>,
}

impl HttpCheckResult {
    /// An empty result for a request pinned to `ip`.
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            status_code: 0,
            initial_status_code: 0,
            server_header: String::new(),
            num_redirects: 0,
            content: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// True when no response was ever received.
    pub fn is_zero(&self) -> bool {
        self.status_code == 0
    }

    /// The trace, one line per event, as attached to problem details.
    pub fn trace_text(&self) -> String {
        self.trace.join("\n")
    }
}

impl fmt::Display for HttpCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr_type = if self.ip.is_ipv4() { "IPv4" } else { "IPv6" };
        write!(
            f,
            "[Address={},Address Type={},Server={},HTTP Status={}",
            self.ip, addr_type, self.server_header, self.initial_status_code
        )?;
        if self.num_redirects > 0 {
            write!(
                f,
                ",Number of Redirects={},Final HTTP Status={}",
                self.num_redirects, self.status_code
            )?;
        }
        f.write_str("]")
    }
}

struct ProbeState {
    result: HttpCheckResult,
    first_dial: Option<Instant>,
    redirect_error: Option<String>,
}

/// Shared recorder written by the resolver, the redirect policy and the
/// probe itself while a request is in flight.
#[derive(Clone)]
pub(crate) struct ProbeRecorder(Arc<Mutex<ProbeState>>);

impl ProbeRecorder {
    pub(crate) fn new(ip: IpAddr) -> Self {
        Self(Arc::new(Mutex::new(ProbeState {
            result: HttpCheckResult::new(ip),
            first_dial: None,
            redirect_error: None,
        })))
    }

    fn state(&self) -> MutexGuard<'_, ProbeState> {
        // A panic while holding the lock cannot leave the trace inconsistent
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `@{ms}ms: {line}`, timed from the first trace line.
    pub(crate) fn trace(&self, line: impl AsRef<str>) {
        let mut state = self.state();
        let started = *state.first_dial.get_or_insert_with(Instant::now);
        let entry = format!("@{}ms: {}", started.elapsed().as_millis(), line.as_ref());
        trace!("{entry}");
        state.result.trace.push(entry);
    }

    /// Records a received status line.
    pub(crate) fn observe_status(&self, status: StatusCode, server: Option<&str>) {
        {
            let mut state = self.state();
            if state.result.initial_status_code == 0 {
                state.result.initial_status_code = status.as_u16();
            }
            state.result.status_code = status.as_u16();
            state.result.server_header = server.unwrap_or_default().to_string();
        }
        self.trace(format!("Server response: HTTP {status}"));
    }

    pub(crate) fn count_redirect(&self) {
        self.state().result.num_redirects += 1;
    }

    pub(crate) fn set_redirect_error(&self, message: String) {
        self.state().redirect_error = Some(message);
    }

    pub(crate) fn take_redirect_error(&self) -> Option<String> {
        self.state().redirect_error.take()
    }

    pub(crate) fn set_content(&self, content: Vec<u8>) {
        self.state().result.content = content;
    }

    pub(crate) fn snapshot(&self) -> HttpCheckResult {
        self.state().result.clone()
    }
}
