//! # Invocation Messages
//!
//! The message a [`HandlerClient`](crate::client::HandlerClient) sends to a
//! [`HandlerService`](crate::engine::HandlerService) for every invocation.

use crate::context::CallbackContext;
use crate::handler::{HandlerRequest, OperationType};
use crate::progress::ProgressEvent;
use tokio::sync::oneshot;

/// Type alias for the one-shot channel an invocation's progress event is returned on.
pub type Response<M> = oneshot::Sender<ProgressEvent<M>>;

/// One invocation of a lifecycle operation.
///
/// `callback_context` is `None` for the first invocation of a logical operation and the context
/// returned by the previous invocation afterwards.
#[derive(Debug)]
pub struct Invocation<M> {
    pub operation: OperationType,
    pub request: HandlerRequest<M>,
    pub callback_context: Option<CallbackContext>,
    pub respond_to: Response<M>,
}
