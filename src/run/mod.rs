//! Scan orchestration.
//!
//! This module defines the [`Engine`], which owns the resources shared by all
//! scans (resolvers, HTTP clients, the ordered checker list) and runs one scan
//! per [`Engine::check`] call.

mod init;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use log::{debug, info, warn};

use crate::checker::Checker;
use crate::config::ScanOptions;
use crate::context::{ScanContext, ScanResources};
use crate::dns::normalize_fqdn;
use crate::error_handling::{panic_message, CheckError, ScanError};
use crate::method::ValidationMethod;
use crate::problem::{has_fatal, Problem};

/// Runs scans against a fixed, ordered list of checkers.
///
/// Building an engine sets up the resolvers and HTTP clients once. Every call
/// to [`Engine::check`] gets its own [`ScanContext`], so concurrent scans never
/// share a lookup cache.
///
/// # Example
///
/// ```no_run
/// use acme_precheck::{Engine, EngineConfig, ScanOptions, ValidationMethod};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Engine::new(EngineConfig::default())?;
/// let problems = engine
///     .check("example.org", ValidationMethod::Http01, ScanOptions::default())
///     .await?;
/// for problem in problems {
///     println!("{problem}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    resources: ScanResources,
    checkers: Arc<Vec<Arc<dyn Checker>>>,
}

impl Engine {
    /// Names of the checkers, in the order they run.
    pub fn checker_names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// Scans `domain` for problems that would prevent issuance with `method`.
    ///
    /// The domain is trimmed, lowercased and stripped of a trailing dot before
    /// any checker sees it. Checkers run in order until one of them reports a
    /// fatal problem. Network failures are reported as problems; an `Err` means
    /// the scan itself could not be completed.
    ///
    /// # Errors
    ///
    /// - `ScanError::InvalidOptions` if `options` are rejected
    /// - `ScanError::Checker` if a checker fails for a reason other than
    ///   not being applicable
    /// - `ScanError::Panicked` if a checker panics
    pub async fn check(
        &self,
        domain: &str,
        method: ValidationMethod,
        options: ScanOptions,
    ) -> Result<Vec<Problem>, ScanError> {
        options.validate()?;

        let domain = normalize_fqdn(domain);
        let ctx = ScanContext::new(self.resources.clone(), options);
        let started = Instant::now();
        info!("Scanning {domain} for {method}");

        let outcome = AssertUnwindSafe(self.run_checkers(&ctx, &domain, &method))
            .catch_unwind()
            .await;

        let problems = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload);
                warn!("Scan of {domain} panicked: {message}");
                return Err(ScanError::Panicked(message));
            }
        };

        info!(
            "Scan of {domain} finished in {:.2}s with {} problem(s)",
            started.elapsed().as_secs_f64(),
            problems.len()
        );
        Ok(problems)
    }

    async fn run_checkers(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, ScanError> {
        let mut problems: Vec<Problem> = Vec::new();

        for checker in self.checkers.iter() {
            let name = checker.name();
            debug!("Running checker {name}");

            match checker.check(ctx, domain, method).await {
                Ok(found) => {
                    debug!("Checker {name} found {} problem(s)", found.len());
                    problems.extend(found.into_iter().filter(|p| !p.is_empty()));
                }
                Err(CheckError::NotApplicable) => {
                    debug!("Checker {name} not applicable");
                }
                Err(source) => {
                    warn!("Checker {name} failed: {source}");
                    return Err(ScanError::Checker {
                        checker: name,
                        source,
                    });
                }
            }

            if has_fatal(&problems) {
                debug!("Fatal problem found after {name}, stopping");
                break;
            }
        }

        Ok(problems)
    }
}
