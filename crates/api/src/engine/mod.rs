//! Resource orchestration.
//!
//! Turns resource metadata plus a request into store calls and view
//! payloads. Every operation checks the resource policy before it touches
//! the store.

pub mod crud;
pub mod import;
pub mod records;
pub mod search;

use vstack_core::error::CoreError;

/// Reject with 403 unless `allowed`.
pub(crate) fn ensure(allowed: bool, action: &str, resource: &str) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        tracing::debug!(action, resource, "Permission denied");
        Err(CoreError::Forbidden(format!(
            "Not allowed to {action} {resource}"
        )))
    }
}
