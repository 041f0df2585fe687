//! # Idempotency Gate
//!
//! Makes a step run at most once per logical operation, however many invocations the operation
//! spans. Completion is recorded in the [`CallbackContext`] as soon as the step's body reports
//! that the pipeline may go on, so a later resumption skips straight past it.
//!
//! A body that asks to be re-invoked later, or that fails, leaves the flag unset and will run
//! again on the next invocation.

use crate::context::CallbackContext;
use crate::progress::ProgressEvent;
use std::future::Future;
use tracing::debug;

/// Runs `body` unless `is_complete` already reads true, then marks completion on success.
pub async fn exec_once_with<M, F, Fut, G, S>(
    progress: ProgressEvent<M>,
    body: F,
    is_complete: G,
    mark_complete: S,
) -> ProgressEvent<M>
where
    F: FnOnce(ProgressEvent<M>) -> Fut,
    Fut: Future<Output = ProgressEvent<M>>,
    G: FnOnce(&CallbackContext) -> bool,
    S: FnOnce(&mut CallbackContext),
{
    if is_complete(&progress.callback_context) {
        return progress;
    }
    let mut next = body(progress).await;
    if next.can_continue() || next.is_success() {
        mark_complete(&mut next.callback_context);
    }
    next
}

/// [`exec_once_with`] keyed by a step name in the context's completion map.
pub async fn exec_once<M, F, Fut>(step: &str, progress: ProgressEvent<M>, body: F) -> ProgressEvent<M>
where
    F: FnOnce(ProgressEvent<M>) -> Fut,
    Fut: Future<Output = ProgressEvent<M>>,
{
    if progress.callback_context.is_complete(step) {
        debug!(step, "Step already complete, skipping");
    }
    exec_once_with(
        progress,
        body,
        |ctx| ctx.is_complete(step),
        |ctx| ctx.mark_complete(step),
    )
    .await
}
