//! # Callback Context
//!
//! The progress token that carries a logical operation across invocations.
//!
//! The engine never keeps progress in memory between invocations. Everything a resumed
//! invocation needs to know (which steps already completed, which provider calls are waiting for
//! stabilization, how long they have been waiting) lives in a [`CallbackContext`] that the caller
//! echoes back verbatim. The context serializes to a JSON token, so it survives process restarts.

use crate::error::FrameworkError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackContext {
    /// Step name -> completion flag, read and written by the idempotency gate.
    #[serde(default)]
    steps: BTreeMap<String, bool>,
    /// Steps whose provider call went through and which are waiting for stabilization.
    #[serde(default)]
    invoked: BTreeSet<String>,
    /// Not-yet-stable status checks per step.
    #[serde(default)]
    attempts: BTreeMap<String, u32>,
    #[serde(default)]
    soft_failures: Vec<String>,
    /// Step-specific carried data.
    #[serde(default)]
    data: BTreeMap<String, serde_json::Value>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self, step: &str) -> bool {
        self.steps.get(step).copied().unwrap_or(false)
    }

    pub fn set_complete(&mut self, step: &str, complete: bool) {
        self.steps.insert(step.to_string(), complete);
    }

    pub fn mark_complete(&mut self, step: &str) {
        self.set_complete(step, true);
    }

    pub fn is_invoked(&self, step: &str) -> bool {
        self.invoked.contains(step)
    }

    pub(crate) fn mark_invoked(&mut self, step: &str) {
        self.invoked.insert(step.to_string());
    }

    /// Forgets the invocation and polling state of a step once it has stabilized, so a step that
    /// is allowed to re-run issues its provider call again on the next pass.
    pub(crate) fn finish_step(&mut self, step: &str) {
        self.invoked.remove(step);
        self.attempts.remove(step);
    }

    pub fn attempts(&self, step: &str) -> u32 {
        self.attempts.get(step).copied().unwrap_or(0)
    }

    pub(crate) fn record_attempt(&mut self, step: &str) -> u32 {
        let attempts = self.attempts.entry(step.to_string()).or_insert(0);
        *attempts += 1;
        *attempts
    }

    pub fn record_soft_failure(&mut self, message: impl Into<String>) {
        self.soft_failures.push(message.into());
    }

    pub fn soft_failures(&self) -> &[String] {
        &self.soft_failures
    }

    /// Stores step-specific data under `key`, replacing any previous value.
    pub fn carry<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), FrameworkError> {
        self.data.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Reads data previously stored with [`carry`](Self::carry).
    pub fn carried<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, FrameworkError> {
        self.data
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(FrameworkError::from)
    }

    pub fn to_token(&self) -> Result<String, FrameworkError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_token(token: &str) -> Result<Self, FrameworkError> {
        Ok(serde_json::from_str(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_no_completed_steps() {
        let ctx = CallbackContext::new();
        assert!(!ctx.is_complete("add-tags"));
        assert!(!ctx.is_invoked("add-tags"));
        assert_eq!(ctx.attempts("add-tags"), 0);
    }

    #[test]
    fn test_token_preserves_progress() {
        let mut ctx = CallbackContext::new();
        ctx.mark_complete("add-tags");
        ctx.mark_invoked("rds::modify-db-cluster");
        ctx.record_attempt("rds::modify-db-cluster");
        ctx.record_soft_failure("tagging skipped");
        ctx.carry("parameters", &vec!["a", "b"]).unwrap();

        let restored = CallbackContext::from_token(&ctx.to_token().unwrap()).unwrap();

        assert_eq!(restored, ctx);
        assert!(restored.is_complete("add-tags"));
        assert_eq!(restored.attempts("rds::modify-db-cluster"), 1);
        let carried: Option<Vec<String>> = restored.carried("parameters").unwrap();
        assert_eq!(carried, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_empty_token_object_is_a_fresh_context() {
        let ctx = CallbackContext::from_token("{}").unwrap();
        assert_eq!(ctx, CallbackContext::new());
    }

    #[test]
    fn test_finish_step_clears_polling_state_but_not_completion() {
        let mut ctx = CallbackContext::new();
        ctx.mark_complete("apply");
        ctx.mark_invoked("apply");
        ctx.record_attempt("apply");

        ctx.finish_step("apply");

        assert!(ctx.is_complete("apply"));
        assert!(!ctx.is_invoked("apply"));
        assert_eq!(ctx.attempts("apply"), 0);
    }

    #[test]
    fn test_carried_type_mismatch_is_an_error() {
        let mut ctx = CallbackContext::new();
        ctx.carry("count", &"not a number").unwrap();
        let result: Result<Option<u32>, _> = ctx.carried("count");
        assert!(matches!(result, Err(FrameworkError::CallbackContext(_))));
    }
}
