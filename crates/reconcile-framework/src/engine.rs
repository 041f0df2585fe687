//! # Reconciliation Engine
//!
//! [`Orchestrator`] is the single entry point of an invocation: it checks the request, restores
//! the progress event from the caller's callback context and dispatches to the handler's
//! pipeline for the operation.
//!
//! [`HandlerService`] is the server half that owns an orchestrator. Each invocation it receives
//! runs in its own task, so a slow provider call for one resource never holds up another. Keeping
//! two invocations for the same identifier apart is the caller's job.

use crate::client::HandlerClient;
use crate::context::CallbackContext;
use crate::error::{FrameworkError, HandlerErrorCode};
use crate::handler::{HandlerRequest, OperationType, ResourceHandler};
use crate::message::Invocation;
use crate::progress::{Outcome, ProgressEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

pub struct Orchestrator<H: ResourceHandler> {
    handler: H,
}

impl<H: ResourceHandler> Orchestrator<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs one invocation of `operation`.
    ///
    /// `callback_context` is `None` on the first invocation of a logical operation; on every
    /// later one it is the context returned last time, and the handler's pipeline skips the
    /// steps it records as complete.
    #[instrument(
        skip_all,
        fields(resource_type = H::TYPE_NAME, operation = %operation, token = %request.client_request_token)
    )]
    pub async fn handle(
        &self,
        client: &H::Client,
        operation: OperationType,
        request: &HandlerRequest<H::Model>,
        callback_context: Option<CallbackContext>,
    ) -> ProgressEvent<H::Model> {
        let resumed = callback_context.is_some();
        let context = callback_context.unwrap_or_default();
        let model = request.desired_resource_state.clone();

        if let Err(e) = validate(operation, request) {
            warn!(error = %e, "Rejected invocation");
            return ProgressEvent::failed(model, context, HandlerErrorCode::InvalidRequest, e.to_string());
        }

        debug!(resumed, ?model, "Invocation started");
        let progress = ProgressEvent::progress(model, context);
        let event = match operation {
            OperationType::Create => self.handler.create(request, progress, client).await,
            OperationType::Read => self.handler.read(request, progress, client).await,
            OperationType::Update => self.handler.update(request, progress, client).await,
            OperationType::Delete => self.handler.delete(request, progress, client).await,
        };

        match event.outcome() {
            Outcome::Success => info!("Succeeded"),
            Outcome::InProgress { delay } => info!(?delay, "In progress"),
            Outcome::Retryable { code, delay } => warn!(error_code = %code, ?delay, "Retrying"),
            Outcome::Failed { code, message } => warn!(error_code = %code, reason = %message, "Failed"),
        }
        event
    }
}

/// Presence checks only; schema validation is the caller's business.
fn validate<M>(operation: OperationType, request: &HandlerRequest<M>) -> Result<(), FrameworkError> {
    if request.client_request_token.is_empty() {
        return Err(FrameworkError::InvalidRequest(
            "client request token is required".to_string(),
        ));
    }
    if operation == OperationType::Update && request.previous_resource_state.is_none() {
        return Err(FrameworkError::InvalidRequest(
            "update requires the previous resource state".to_string(),
        ));
    }
    Ok(())
}

/// Serves invocations for one resource type.
///
/// # Usage Pattern
///
/// 1. **Create**: `HandlerService::new()` returns the service and a [`HandlerClient`].
/// 2. **Wire**: the provisioning client is injected with `run(client)`, not at construction.
/// 3. **Run**: spawn `run` on a Tokio task; it stops once every `HandlerClient` is dropped.
pub struct HandlerService<H: ResourceHandler> {
    orchestrator: Orchestrator<H>,
    receiver: mpsc::Receiver<Invocation<H::Model>>,
}

impl<H: ResourceHandler> HandlerService<H> {
    /// `buffer_size` is the channel capacity; callers wait when it is full.
    pub fn new(buffer_size: usize, handler: H) -> (Self, HandlerClient<H::Model>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            orchestrator: Orchestrator::new(handler),
            receiver,
        };
        (service, HandlerClient::new(sender))
    }

    /// Processes invocations until the channel closes, then waits for the ones still running.
    pub async fn run(self, client: Arc<H::Client>) {
        let resource_type = H::TYPE_NAME;
        info!(resource_type, "Handler service started");

        let HandlerService {
            orchestrator,
            mut receiver,
        } = self;
        let orchestrator = Arc::new(orchestrator);
        let mut in_flight = JoinSet::new();
        let mut served = 0usize;

        loop {
            tokio::select! {
                invocation = receiver.recv() => {
                    let Some(invocation) = invocation else { break };
                    in_flight.spawn(serve(orchestrator.clone(), client.clone(), invocation));
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    served += finished(resource_type, joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            served += finished(resource_type, joined);
        }

        info!(resource_type, served, "Shutdown");
    }
}

async fn serve<H: ResourceHandler>(
    orchestrator: Arc<Orchestrator<H>>,
    client: Arc<H::Client>,
    invocation: Invocation<H::Model>,
) {
    let Invocation {
        operation,
        request,
        callback_context,
        respond_to,
    } = invocation;
    let event = orchestrator
        .handle(&client, operation, &request, callback_context)
        .await;
    if respond_to.send(event).is_err() {
        warn!(resource_type = H::TYPE_NAME, %operation, "Caller went away before the response");
    }
}

fn finished(resource_type: &str, joined: Result<(), tokio::task::JoinError>) -> usize {
    match joined {
        Ok(()) => 1,
        Err(e) => {
            error!(resource_type, error = %e, "Invocation task failed");
            0
        }
    }
}
