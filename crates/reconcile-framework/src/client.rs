//! # Handler Client
//!
//! The caller's side of a [`HandlerService`](crate::engine::HandlerService).

use crate::context::CallbackContext;
use crate::error::FrameworkError;
use crate::handler::{HandlerRequest, OperationType};
use crate::message::Invocation;
use crate::progress::ProgressEvent;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// A cloneable handle for invoking a resource handler.
///
/// Invocations are queued on the service's channel and served one at a time; each call resolves
/// to the progress event for that single invocation.
#[derive(Clone)]
pub struct HandlerClient<M> {
    sender: mpsc::Sender<Invocation<M>>,
}

impl<M> HandlerClient<M> {
    pub fn new(sender: mpsc::Sender<Invocation<M>>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self, request, callback_context), fields(token = %request.client_request_token))]
    pub async fn handle(
        &self,
        operation: OperationType,
        request: HandlerRequest<M>,
        callback_context: Option<CallbackContext>,
    ) -> Result<ProgressEvent<M>, FrameworkError> {
        debug!(resumed = callback_context.is_some(), "Sending invocation");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(Invocation {
                operation,
                request,
                callback_context,
                respond_to,
            })
            .await
            .map_err(|_| FrameworkError::ServiceClosed)?;
        response.await.map_err(|_| FrameworkError::ServiceDropped)
    }
}
