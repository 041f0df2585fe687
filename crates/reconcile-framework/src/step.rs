//! # Step Executor
//!
//! Runs one named mutation: translate the model into a provider request, invoke it once, fold
//! the response back into the model, then check stabilization.
//!
//! The provider call and the stabilization check may land in different invocations. Once the
//! call succeeds the step is recorded as *invoked* in the [`CallbackContext`], and a resumed
//! invocation goes straight to the status check instead of calling the provider again. When
//! the resource is stable those markers are cleared.
//!
//! Provider errors are classified here, where they are raised, with [`handle_exception`].

use crate::config::{Backoff, HandlerConfig};
use crate::context::CallbackContext;
use crate::error::{HandlerErrorCode, ProviderError, StepError};
use crate::progress::ProgressEvent;
use crate::rules::{ErrorRuleSet, ErrorStatus};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A single provider mutation and how to tell when it has settled.
#[async_trait]
pub trait Mutation: Send + Sync {
    type Model: Send + Sync;
    type Client: ?Sized + Send + Sync;
    type Request: Debug + Send;
    type Response: Send;

    /// Stable step name, used as the key in the callback context.
    fn name(&self) -> &str;

    fn translate(&self, model: &Self::Model) -> Self::Request;

    async fn invoke(
        &self,
        client: &Self::Client,
        request: Self::Request,
    ) -> Result<Self::Response, ProviderError>;

    /// Folds provider-assigned values (ARNs, endpoints) into the model.
    fn apply_response(&self, _model: &mut Self::Model, _response: Self::Response) {}

    /// One status check. Mutations that settle synchronously keep the default.
    async fn stabilize(&self, _client: &Self::Client, _model: &Self::Model) -> Result<bool, StepError> {
        Ok(true)
    }
}

pub struct StepExecutor<'a> {
    backoff: Backoff,
    rules: &'a ErrorRuleSet,
}

impl<'a> StepExecutor<'a> {
    pub fn new(config: &HandlerConfig, rules: &'a ErrorRuleSet) -> Self {
        Self {
            backoff: config.backoff,
            rules,
        }
    }

    pub fn rules(&self) -> &'a ErrorRuleSet {
        self.rules
    }

    pub fn delay(&self) -> Duration {
        self.backoff.delay
    }

    /// Classifies `error` with this executor's rules and backoff.
    pub fn handle<M>(&self, progress: ProgressEvent<M>, error: &StepError) -> ProgressEvent<M> {
        handle_exception(progress, error, self.rules, self.backoff.delay)
    }

    /// Runs `mutation` against `client`, resuming at the stabilization check when the call
    /// already went through in an earlier invocation.
    pub async fn execute<S: Mutation>(
        &self,
        mutation: &S,
        client: &S::Client,
        progress: ProgressEvent<S::Model>,
    ) -> ProgressEvent<S::Model> {
        let step = mutation.name();
        let ProgressEvent {
            resource_model: mut model,
            callback_context: mut context,
            ..
        } = progress;

        if !context.is_invoked(step) {
            let request = mutation.translate(&model);
            debug!(step, ?request, "Invoking");
            match mutation.invoke(client, request).await {
                Ok(response) => {
                    mutation.apply_response(&mut model, response);
                    context.mark_invoked(step);
                    info!(step, "Invoked");
                }
                Err(e) => {
                    return self.handle(ProgressEvent::progress(model, context), &StepError::Provider(e));
                }
            }
        } else {
            debug!(step, attempts = context.attempts(step), "Resuming at stabilization");
        }

        match mutation.stabilize(client, &model).await {
            Ok(true) => {
                context.finish_step(step);
                info!(step, "Stabilized");
                ProgressEvent::progress(model, context)
            }
            Ok(false) => self.not_yet_stable(step, model, context),
            Err(e) => {
                let mut event = self.handle(ProgressEvent::progress(model, context), &e);
                if event.can_continue() {
                    event.callback_context.finish_step(step);
                } else if event.is_in_progress() {
                    // A retried status check still counts toward the timeout.
                    let attempts = event.callback_context.record_attempt(step);
                    if self.backoff.is_exhausted(attempts) {
                        let error = StepError::NotStabilized(format!(
                            "{step} timed out after {attempts} status checks: {e}"
                        ));
                        return self.handle(ProgressEvent::progress(event.resource_model, event.callback_context), &error);
                    }
                }
                event
            }
        }
    }

    fn not_yet_stable<M>(&self, step: &str, model: M, mut context: CallbackContext) -> ProgressEvent<M> {
        let attempts = context.record_attempt(step);
        if self.backoff.is_exhausted(attempts) {
            let error = StepError::NotStabilized(format!(
                "{step} timed out after {attempts} status checks"
            ));
            return self.handle(ProgressEvent::progress(model, context), &error);
        }
        debug!(step, attempts, delay = ?self.backoff.delay, "Not yet stable");
        ProgressEvent::in_progress_after(model, context, self.backoff.delay)
    }
}

/// Turns a step error into the progress event for this invocation.
///
/// Terminal-state and timeout failures become `Failed(NotStabilized)` without consulting the
/// rules; provider errors take the status of the first matching rule.
pub fn handle_exception<M>(
    progress: ProgressEvent<M>,
    error: &StepError,
    rules: &ErrorRuleSet,
    delay: Duration,
) -> ProgressEvent<M> {
    let ProgressEvent {
        resource_model: model,
        callback_context: context,
        ..
    } = progress;

    let provider_error = match error {
        StepError::NotStabilized(_) => {
            warn!(error_code = %HandlerErrorCode::NotStabilized, error = %error, "Stabilization failed");
            return ProgressEvent::failed(model, context, HandlerErrorCode::NotStabilized, error.to_string());
        }
        StepError::Provider(e) => e,
    };

    match rules.classify(provider_error) {
        ErrorStatus::Fail(code) => {
            warn!(error_code = %code, error = %provider_error, "Failed");
            ProgressEvent::failed(model, context, code, provider_error.message.clone())
        }
        ErrorStatus::Retry(code) => {
            warn!(error_code = %code, error = %provider_error, ?delay, "Retrying");
            ProgressEvent::retry(model, context, code, provider_error.message.clone(), delay)
        }
        ErrorStatus::Ignore => {
            debug!(error = %provider_error, "Ignored");
            ProgressEvent::progress(model, context)
        }
    }
}
