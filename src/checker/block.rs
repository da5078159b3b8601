//! Concurrent execution of independent checkers.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};

use super::Checker;
use crate::context::ScanContext;
use crate::error_handling::{panic_message, CheckError};
use crate::method::ValidationMethod;
use crate::problem::Problem;

/// Runs its members concurrently and merges their problems.
///
/// The first member error is returned at once and the remaining members are
/// aborted. A member that panics yields [`CheckError::Panicked`]. Members
/// that are not applicable contribute nothing.
pub struct AsyncCheckerBlock {
    checkers: Vec<Arc<dyn Checker>>,
}

impl AsyncCheckerBlock {
    /// Groups `checkers`; they start in order but finish in any order.
    pub fn new(checkers: Vec<Arc<dyn Checker>>) -> Self {
        Self { checkers }
    }
}

#[async_trait]
impl Checker for AsyncCheckerBlock {
    fn name(&self) -> &'static str {
        "asyncCheckerBlock"
    }

    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError> {
        let mut tasks = FuturesUnordered::new();
        let mut aborts = Vec::with_capacity(self.checkers.len());
        for checker in &self.checkers {
            let checker = Arc::clone(checker);
            let ctx = ctx.clone();
            let domain = domain.to_string();
            let method = method.clone();
            let name = checker.name();
            let handle = tokio::spawn(async move { checker.check(&ctx, &domain, &method).await });
            aborts.push(handle.abort_handle());
            tasks.push(async move { (name, handle.await) });
        }

        let mut problems = Vec::new();
        while let Some((name, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    warn!("Checker {name} panicked: {message}");
                    Err(CheckError::Panicked(message))
                }
                Err(e) => Err(CheckError::Failed(anyhow!("checker {name} was cancelled: {e}"))),
            };

            match outcome {
                Ok(found) => {
                    debug!("Checker {name} found {} problem(s)", found.len());
                    problems.extend(found);
                }
                Err(CheckError::NotApplicable) => {
                    debug!("Checker {name} not applicable");
                }
                Err(e) => {
                    // A dropped JoinHandle only detaches its task
                    for handle in &aborts {
                        handle.abort();
                    }
                    return Err(e);
                }
            }
        }

        Ok(problems)
    }
}
