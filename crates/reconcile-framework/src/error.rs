//! # Framework Errors
//!
//! This module defines the error types shared by every resource handler:
//!
//! - [`HandlerErrorCode`] - the caller-facing taxonomy reported on failed (or retried) progress events.
//! - [`ProviderError`] - a typed failure raised by the provisioning service. Its `code` plays the
//!   role of the exception type that [`ErrorRuleSet`](crate::rules::ErrorRuleSet)s match on.
//! - [`StepError`] - what a step can fail with before classification.
//! - [`FrameworkError`] - failures of the engine plumbing itself (channels, progress tokens).
//!
//! Provider failures never escape a handler as a Rust error. They are classified exactly once,
//! where they are raised, into a [`ProgressEvent`](crate::progress::ProgressEvent).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerErrorCode {
    NotFound,
    AlreadyExists,
    InvalidRequest,
    AccessDenied,
    ServiceLimitExceeded,
    /// A conflicting mutation is in progress on the resource. Retryable.
    ResourceConflict,
    /// Retryable.
    Throttling,
    /// A terminal failure status was observed while waiting for stabilization.
    NotStabilized,
    /// Unmatched or unexpected failure.
    InternalError,
}

impl HandlerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerErrorCode::NotFound => "NotFound",
            HandlerErrorCode::AlreadyExists => "AlreadyExists",
            HandlerErrorCode::InvalidRequest => "InvalidRequest",
            HandlerErrorCode::AccessDenied => "AccessDenied",
            HandlerErrorCode::ServiceLimitExceeded => "ServiceLimitExceeded",
            HandlerErrorCode::ResourceConflict => "ResourceConflict",
            HandlerErrorCode::Throttling => "Throttling",
            HandlerErrorCode::NotStabilized => "NotStabilized",
            HandlerErrorCode::InternalError => "InternalError",
        }
    }

    /// Whether a failure with this code is worth re-invoking for.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HandlerErrorCode::ResourceConflict | HandlerErrorCode::Throttling
        )
    }
}

impl fmt::Display for HandlerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ProviderError {
    /// Service error code, e.g. `DBClusterNotFoundFault` or `ThrottlingException`.
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors a single step can raise before they are classified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Resource is not stabilized: {0}")]
    NotStabilized(String),
}

/// Errors that can occur within the engine plumbing itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Handler service closed")]
    ServiceClosed,
    #[error("Handler service dropped response channel")]
    ServiceDropped,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Callback context error: {0}")]
    CallbackContext(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_and_throttling_are_retryable() {
        let retryable: Vec<_> = [
            HandlerErrorCode::NotFound,
            HandlerErrorCode::AlreadyExists,
            HandlerErrorCode::InvalidRequest,
            HandlerErrorCode::AccessDenied,
            HandlerErrorCode::ServiceLimitExceeded,
            HandlerErrorCode::ResourceConflict,
            HandlerErrorCode::Throttling,
            HandlerErrorCode::NotStabilized,
            HandlerErrorCode::InternalError,
        ]
        .into_iter()
        .filter(HandlerErrorCode::is_retryable)
        .collect();

        assert_eq!(
            retryable,
            vec![HandlerErrorCode::ResourceConflict, HandlerErrorCode::Throttling]
        );
    }

    #[test]
    fn test_provider_error_display() {
        let error = ProviderError::new("DBClusterNotFoundFault", "cluster db-1 not found");
        assert_eq!(error.to_string(), "DBClusterNotFoundFault: cluster db-1 not found");
    }
}
