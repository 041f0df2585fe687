//! # Invocation Driver
//!
//! The caller's side of the resumable protocol: invoke, wait the requested delay, re-invoke with
//! the returned context, until the operation leaves `InProgress`.
//!
//! Between invocations the context only travels as its JSON token, exactly as it would through
//! an external scheduler that persists it.

use reconcile_framework::{CallbackContext, FrameworkError, HandlerClient, HandlerRequest, OperationType, ProgressEvent};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error("{operation} still in progress after {invocations} invocations")]
    TooManyInvocations {
        operation: OperationType,
        invocations: usize,
    },
}

/// The final event of a logical operation and how many invocations it took.
#[derive(Debug)]
pub struct Completed<M> {
    pub event: ProgressEvent<M>,
    pub invocations: usize,
}

/// Drives `operation` to `Success` or `Failed`.
///
/// Each re-invocation carries the model returned by the previous one as its desired state, so
/// values assigned along the way (a generated identifier, an ARN) are not lost.
#[instrument(skip_all, fields(%operation, token = %request.client_request_token))]
pub async fn drive<M: Clone>(
    client: &HandlerClient<M>,
    operation: OperationType,
    mut request: HandlerRequest<M>,
    max_invocations: usize,
) -> Result<Completed<M>, DriverError> {
    let mut token: Option<String> = None;

    for invocation in 1..=max_invocations {
        let context = token.as_deref().map(CallbackContext::from_token).transpose()?;
        let event = client.handle(operation, request.clone(), context).await?;

        if !event.is_in_progress() {
            info!(invocations = invocation, outcome = ?event.outcome(), "Operation finished");
            return Ok(Completed {
                event,
                invocations: invocation,
            });
        }

        let delay = Duration::from_secs(event.callback_delay_seconds);
        debug!(invocation, ?delay, "Re-invoking later");
        tokio::time::sleep(delay).await;

        token = Some(event.callback_context.to_token()?);
        request.desired_resource_state = event.resource_model;
    }

    warn!(max_invocations, "Giving up");
    Err(DriverError::TooManyInvocations {
        operation,
        invocations: max_invocations,
    })
}
