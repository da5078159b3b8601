//! The checker interface.
//!
//! This module provides:
//! - [`Checker`]: one diagnostic step of a scan
//! - [`AsyncCheckerBlock`]: a group of independent checkers run concurrently
//!   and reported as one
//!
//! A checker returns the problems it found, or [`CheckError::NotApplicable`]
//! when the domain or method is outside its scope. Network failures are
//! problems; only infrastructure faults are other errors.

mod block;

use async_trait::async_trait;

use crate::context::ScanContext;
use crate::error_handling::CheckError;
use crate::method::ValidationMethod;
use crate::problem::Problem;

// Re-export public API
pub use block::AsyncCheckerBlock;

/// One diagnostic step of a scan.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Stable name used in logs and scan errors.
    fn name(&self) -> &'static str;

    /// Examines `domain` (already normalized) for `method`.
    async fn check(
        &self,
        ctx: &ScanContext,
        domain: &str,
        method: &ValidationMethod,
    ) -> Result<Vec<Problem>, CheckError>;
}
