//! # Progress Events
//!
//! A [`ProgressEvent`] is what every invocation returns: the current model, the updated callback
//! context, and whether the logical operation is still in progress, succeeded or failed.
//!
//! Pipelines are written as a chain of [`ProgressEvent::then`] calls. A stage only runs while the
//! previous one asked to continue immediately (`InProgress` with no delay); a success, a failure
//! or a request to be re-invoked later short-circuits the rest of the chain.

use crate::context::CallbackContext;
use crate::error::HandlerErrorCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    InProgress,
    Success,
    Failed,
}

/// The outcome category of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Waiting on the provider; re-invoke after `delay`.
    InProgress { delay: Duration },
    /// A transient failure; re-invoke after `delay`.
    Retryable {
        code: HandlerErrorCode,
        delay: Duration,
    },
    Failed {
        code: HandlerErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent<M> {
    pub status: OperationStatus,
    pub resource_model: M,
    pub callback_context: CallbackContext,
    pub error_code: Option<HandlerErrorCode>,
    pub message: Option<String>,
    pub callback_delay_seconds: u64,
}

impl<M> ProgressEvent<M> {
    /// An in-progress event that lets the pipeline continue in the same invocation.
    pub fn progress(model: M, callback_context: CallbackContext) -> Self {
        Self {
            status: OperationStatus::InProgress,
            resource_model: model,
            callback_context,
            error_code: None,
            message: None,
            callback_delay_seconds: 0,
        }
    }

    /// An in-progress event asking the caller to re-invoke after `delay`.
    pub fn in_progress_after(model: M, callback_context: CallbackContext, delay: Duration) -> Self {
        Self {
            callback_delay_seconds: delay.as_secs().max(1),
            ..Self::progress(model, callback_context)
        }
    }

    /// A retryable failure: in progress, re-invoke after `delay`, with the cause attached.
    pub fn retry(
        model: M,
        callback_context: CallbackContext,
        code: HandlerErrorCode,
        message: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            error_code: Some(code),
            message: Some(message.into()),
            ..Self::in_progress_after(model, callback_context, delay)
        }
    }

    pub fn success(model: M, callback_context: CallbackContext) -> Self {
        Self {
            status: OperationStatus::Success,
            ..Self::progress(model, callback_context)
        }
    }

    pub fn failed(
        model: M,
        callback_context: CallbackContext,
        code: HandlerErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: OperationStatus::Failed,
            error_code: Some(code),
            message: Some(message.into()),
            ..Self::progress(model, callback_context)
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == OperationStatus::InProgress
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == OperationStatus::Failed
    }

    pub fn is_in_progress_callback_delay(&self) -> bool {
        self.is_in_progress() && self.callback_delay_seconds > 0
    }

    /// Whether the next stage of a pipeline may run in this invocation.
    pub fn can_continue(&self) -> bool {
        self.is_in_progress() && self.callback_delay_seconds == 0
    }

    /// Runs the next pipeline stage if this event allows it, otherwise passes it through.
    pub async fn then<F, Fut>(self, stage: F) -> Self
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Self>,
    {
        if self.can_continue() {
            stage(self).await
        } else {
            self
        }
    }

    pub fn outcome(&self) -> Outcome {
        let delay = Duration::from_secs(self.callback_delay_seconds);
        match (self.status, self.error_code) {
            (OperationStatus::Success, _) => Outcome::Success,
            (OperationStatus::InProgress, Some(code)) => Outcome::Retryable { code, delay },
            (OperationStatus::InProgress, None) => Outcome::InProgress { delay },
            (OperationStatus::Failed, code) => Outcome::Failed {
                code: code.unwrap_or(HandlerErrorCode::InternalError),
                message: self.message.clone().unwrap_or_default(),
            },
        }
    }

    pub fn map_model<N>(self, f: impl FnOnce(M) -> N) -> ProgressEvent<N> {
        ProgressEvent {
            status: self.status,
            resource_model: f(self.resource_model),
            callback_context: self.callback_context,
            error_code: self.error_code,
            message: self.message,
            callback_delay_seconds: self.callback_delay_seconds,
        }
    }
}
