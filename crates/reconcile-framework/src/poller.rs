//! # Stabilization Poller
//!
//! Checks, once per invocation, whether an asynchronous provider-side mutation has reached a
//! steady state. The poller never waits: a not-yet-stable answer is turned into an in-progress
//! event by the [`StepExecutor`](crate::step::StepExecutor), and the caller's scheduler does the
//! waiting.
//!
//! "Not found" means different things depending on what we are waiting for. While waiting for a
//! resource to exist it simply is not visible yet; while waiting for it to be gone it is the
//! stable end state.

use crate::error::{HandlerErrorCode, ProviderError, StepError};
use crate::handler::OperationType;
use crate::rules::{ErrorRuleSet, ErrorStatus};
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// A per-resource-type status vocabulary.
pub trait ResourceStatus: Sized + Debug {
    /// Parses a provider status string; unknown strings yield `None`.
    fn parse(status: &str) -> Option<Self>;
    fn is_stable(&self) -> bool;
    /// A failure state the resource will not leave on its own.
    fn is_terminal(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    /// Wait for the resource to exist in a stable state.
    Exists,
    /// Wait for the resource to disappear.
    Gone,
}

impl From<OperationType> for PollTarget {
    fn from(operation: OperationType) -> Self {
        match operation {
            OperationType::Delete => PollTarget::Gone,
            OperationType::Create | OperationType::Read | OperationType::Update => PollTarget::Exists,
        }
    }
}

pub struct StabilizationPoller<'a> {
    rules: &'a ErrorRuleSet,
    target: PollTarget,
}

impl<'a> StabilizationPoller<'a> {
    /// `rules` decide which provider errors mean "not found".
    pub fn new(rules: &'a ErrorRuleSet, target: PollTarget) -> Self {
        Self { rules, target }
    }

    pub fn for_operation(rules: &'a ErrorRuleSet, operation: OperationType) -> Self {
        Self::new(rules, operation.into())
    }

    /// Fetches the status once and evaluates it.
    ///
    /// `fetch` resolves to `Ok(None)` when the provider reports no such resource.
    pub async fn poll<S, Fut>(&self, identifier: &str, fetch: Fut) -> Result<bool, StepError>
    where
        S: ResourceStatus,
        Fut: Future<Output = Result<Option<String>, ProviderError>>,
    {
        match fetch.await {
            Ok(Some(status)) => self.evaluate::<S>(identifier, &status),
            Ok(None) => Ok(self.on_not_found(identifier)),
            Err(e) if self.is_not_found(&e) => Ok(self.on_not_found(identifier)),
            Err(e) => Err(StepError::Provider(e)),
        }
    }

    /// Evaluates an already fetched status string.
    pub fn evaluate<S: ResourceStatus>(&self, identifier: &str, raw: &str) -> Result<bool, StepError> {
        let status = S::parse(raw);
        if status.as_ref().is_some_and(ResourceStatus::is_terminal) {
            return Err(StepError::NotStabilized(format!(
                "{identifier} is in state: {raw}"
            )));
        }
        let stable = match self.target {
            PollTarget::Exists => status.as_ref().is_some_and(ResourceStatus::is_stable),
            PollTarget::Gone => false,
        };
        debug!(identifier, status = raw, stable, "Stabilization check");
        Ok(stable)
    }

    fn is_not_found(&self, error: &ProviderError) -> bool {
        self.rules.classify(error) == ErrorStatus::Fail(HandlerErrorCode::NotFound)
    }

    fn on_not_found(&self, identifier: &str) -> bool {
        let stable = self.target == PollTarget::Gone;
        debug!(identifier, stable, "Resource not found while stabilizing");
        stable
    }
}
