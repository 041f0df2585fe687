//! # Handler Configuration
//!
//! Process-wide, read-only settings established at startup. Each resource type carries its own
//! [`HandlerConfig`]; the only knob today is the constant [`Backoff`] used for re-invoke delays and
//! the stabilization timeout ceiling.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub const CALLBACK_DELAY_ENV: &str = "RECONCILE_CALLBACK_DELAY_SECONDS";
pub const STABILIZATION_TIMEOUT_ENV: &str = "RECONCILE_STABILIZATION_TIMEOUT_SECONDS";

/// Constant backoff: wait `delay` between invocations, give up stabilizing after `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    pub delay: Duration,
    pub timeout: Duration,
}

impl Backoff {
    pub fn constant(delay: Duration, timeout: Duration) -> Self {
        Self { delay, timeout }
    }

    /// Whether `attempts` not-yet-stable checks have used up the timeout.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.delay.saturating_mul(attempts) >= self.timeout
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::constant(Duration::from_secs(30), Duration::from_secs(3 * 60 * 60))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub backoff: Backoff,
}

impl HandlerConfig {
    pub fn new(backoff: Backoff) -> Self {
        Self { backoff }
    }

    /// Applies `RECONCILE_CALLBACK_DELAY_SECONDS` and `RECONCILE_STABILIZATION_TIMEOUT_SECONDS`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(delay) = seconds(&lookup, CALLBACK_DELAY_ENV) {
            self.backoff.delay = delay;
        }
        if let Some(timeout) = seconds(&lookup, STABILIZATION_TIMEOUT_ENV) {
            self.backoff.timeout = timeout;
        }
        self
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring invalid configuration override");
            None
        }
    }
}
