//! Diagnostic findings.
//!
//! Every checker reports what it finds as a list of [`Problem`]s. A problem is
//! a finding, not a failure of the engine: scans that find a broken DNSSEC
//! chain still succeed and return the problem that describes it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};

/// How serious a finding is.
///
/// `Fatal` problems stop the scan. `Debug` problems are informational only and
/// are expected to be hidden by presentation layers by default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum Severity {
    /// Issuance will certainly fail; no further checks are run.
    Fatal,
    /// Issuance will very likely fail.
    Error,
    /// Issuance may fail or behave unexpectedly.
    Warning,
    /// Worth knowing, not a problem in itself.
    Info,
    /// Raw diagnostic evidence.
    Debug,
}

impl Severity {
    /// Position in display order, worst first. `Debug` always sorts last.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Fatal => 0,
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Debug => 4,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by display position: `Fatal < Error < Warning < Info < Debug`.
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// An immutable diagnostic finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Short machine-stable identifier, e.g. `CAAIssuanceNotAllowed`.
    pub name: String,
    /// Human-readable description of the issue and its consequence.
    pub explanation: String,
    /// Raw supporting evidence (records, HTTP trace, error text).
    pub detail: String,
    /// How serious the finding is.
    pub severity: Severity,
}

impl Problem {
    pub fn new(
        name: impl Into<String>,
        explanation: impl Into<String>,
        detail: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            explanation: explanation.into(),
            detail: detail.into(),
            severity,
        }
    }

    /// An informational `Debug` problem.
    pub fn debug(
        name: impl Into<String>,
        explanation: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(name, explanation, detail, Severity::Debug)
    }

    /// A problem describing a failure of the checking process itself.
    pub fn internal(message: impl Into<String>, severity: Severity) -> Self {
        Self::new(
            "InternalProblem",
            "An internal error occurred while checking the domain",
            message,
            severity,
        )
    }

    /// True for the empty sentinel, which must never reach a result list.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// True for `Fatal` problems.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// True for `Debug` problems.
    pub fn is_debug(&self) -> bool {
        self.severity == Severity::Debug
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.name, self.explanation, self.detail)
    }
}

/// Reports whether any problem in the slice is `Fatal`.
///
/// This is the only signal the orchestrator uses to stop a scan early.
pub fn has_fatal(problems: &[Problem]) -> bool {
    problems.iter().any(Problem::is_fatal)
}

/// Sorts problems worst first, keeping the discovery order within a severity.
pub fn sort_problems(problems: &mut [Problem]) {
    problems.sort_by_key(|p| p.severity);
}

/// A fatal failure while resolving `name`/`rtype` through the validating resolver.
pub fn dns_lookup_failed(name: &str, rtype: &str, err: impl fmt::Display) -> Problem {
    Problem::new(
        "DNSLookupFailed",
        format!("A fatal issue occurred during the DNS lookup process for {name}/{rtype}."),
        err.to_string(),
        Severity::Fatal,
    )
}
