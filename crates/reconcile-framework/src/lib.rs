//! # Reconcile Framework
//!
//! A generic, resumable reconciliation engine for resources managed through an asynchronous
//! provisioning API. Mutations take minutes to hours to settle, and the caller's invocation
//! model is short-lived: every invocation does as much as it can, then returns a
//! [`ProgressEvent`] telling the caller whether to stop or to come back later.
//!
//! The engine keeps nothing in memory between invocations. All progress lives in the
//! [`CallbackContext`], which the caller echoes back and which survives a process restart as a
//! JSON token.
//!
//! ## Architecture Overview
//!
//! Leaf first:
//!
//! 1. **Error Classifier** ([`rules`]) - ordered [`ErrorRuleSet`]s mapping provider failures to
//!    fail, retry or ignore.
//! 2. **Tag Reconciler** ([`tagging`]) - diffs the system, stack and resource tag layers and
//!    applies them on a best-effort basis.
//! 3. **Stabilization Poller** ([`poller`]) - one status check per invocation.
//! 4. **Step Executor** ([`step`]) - translate, invoke once, stabilize, classify.
//! 5. **Idempotency Gate** ([`gate`]) - [`exec_once`] skips steps a previous invocation
//!    completed.
//! 6. **Orchestrator** ([`engine`]) - dispatches an invocation to the [`ResourceHandler`]
//!    pipeline for its operation.
//!
//! ## Writing a Pipeline
//!
//! A handler chains stages with [`ProgressEvent::then`]. A stage runs only while the previous
//! one asks to continue right away, so a stage that needs to wait simply returns
//! [`ProgressEvent::in_progress_after`] and the rest of the chain is skipped until the next
//! invocation:
//!
//! ```rust
//! use reconcile_framework::{exec_once, CallbackContext, ProgressEvent};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! async fn invocation(context: CallbackContext, ready: bool) -> ProgressEvent<&'static str> {
//!     ProgressEvent::progress("db-1", context)
//!         .then(|p| exec_once("create", p, |p| async move { p }))
//!         .await
//!         .then(|p| async move {
//!             if ready {
//!                 p
//!             } else {
//!                 ProgressEvent::in_progress_after(p.resource_model, p.callback_context, Duration::from_secs(30))
//!             }
//!         })
//!         .await
//!         .then(|p| async move { ProgressEvent::success(p.resource_model, p.callback_context) })
//!         .await
//! }
//!
//! let first = invocation(CallbackContext::new(), false).await;
//! assert_eq!(first.callback_delay_seconds, 30);
//! assert!(first.callback_context.is_complete("create"));
//!
//! // The caller waits, then re-invokes with the returned context.
//! let second = invocation(first.callback_context, true).await;
//! assert!(second.is_success());
//! # }
//! ```
//!
//! ## Serving Handlers
//!
//! [`HandlerService`] owns an [`Orchestrator`] and serves invocations from a channel, one at a
//! time; [`HandlerClient`] is the cloneable caller side. The provisioning client is injected
//! when the service starts (`run(client)`), not when it is built.
//!
//! ## Testing
//!
//! The [`mock`] module has a [`CallRecorder`](mock::CallRecorder) for counting provider calls and
//! injecting failures, which is how "a completed step never runs twice" is tested.

pub mod client;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod gate;
pub mod handler;
pub mod message;
pub mod mock;
pub mod poller;
pub mod progress;
pub mod rules;
pub mod step;
pub mod tagging;
pub mod tracing;

// Re-export core types for convenience
pub use client::HandlerClient;
pub use config::{Backoff, HandlerConfig};
pub use context::CallbackContext;
pub use engine::{HandlerService, Orchestrator};
pub use error::{FrameworkError, HandlerErrorCode, ProviderError, StepError};
pub use gate::{exec_once, exec_once_with};
pub use handler::{HandlerRequest, OperationType, ResourceHandler};
pub use message::Invocation;
pub use poller::{PollTarget, ResourceStatus, StabilizationPoller};
pub use progress::{OperationStatus, Outcome, ProgressEvent};
pub use rules::{ErrorRuleSet, ErrorStatus, DEFAULT_ERROR_RULE_SET};
pub use step::{handle_exception, Mutation, StepExecutor};
pub use tagging::{TagDiff, TagReconciler, TagSet, Tags, TaggingClient};
