//! # Test Doubles
//!
//! Provisioning-service fakes are built from two small pieces:
//!
//! - [`CallRecorder`] records every API call a fake receives and injects scripted
//!   [`ProviderError`]s through a fluent expectation API.
//! - [`Script`] is a queue of values a fake hands out one per call (status sequences, for
//!   example), falling back to the fake's own behaviour once it runs dry.
//!
//! Call counts are how idempotency is tested: a step that completed must not reach the service
//! again on a resumed invocation.
//!
//! ```rust
//! use reconcile_framework::mock::CallRecorder;
//! use reconcile_framework::ProviderError;
//!
//! let recorder = CallRecorder::new();
//! recorder
//!     .expect("ModifyDBCluster")
//!     .return_err(ProviderError::new("ThrottlingException", "Rate exceeded"));
//!
//! // Calls to other APIs pass straight through.
//! assert!(recorder.record("DescribeDBClusters").is_ok());
//! assert!(recorder.record("ModifyDBCluster").is_err());
//! assert!(recorder.record("ModifyDBCluster").is_ok());
//!
//! assert_eq!(recorder.count("ModifyDBCluster"), 2);
//! recorder.verify();
//! ```

use crate::error::ProviderError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Expectation {
    api: String,
    error: ProviderError,
}

#[derive(Default)]
struct RecorderState {
    calls: Vec<String>,
    expectations: VecDeque<Expectation>,
}

/// Records API calls and hands out injected failures.
///
/// Cloning shares the underlying log, so a test can keep a handle while the fake owns another.
#[derive(Clone, Default)]
pub struct CallRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a call to `api`; finish with [`ExpectationBuilder::return_err`].
    pub fn expect(&self, api: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            api: api.to_string(),
            state: self.state.clone(),
        }
    }

    /// Logs a call to `api` and returns the first pending failure queued for it, if any.
    pub fn record(&self, api: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(api.to_string());
        let pending = state.expectations.iter().position(|exp| exp.api == api);
        match pending.and_then(|index| state.expectations.remove(index)) {
            Some(expectation) => Err(expectation.error),
            None => Ok(()),
        }
    }

    /// How many times `api` was called.
    pub fn count(&self, api: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|call| *call == api).count()
    }

    /// Every call in the order received.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forgets the call log, keeping pending expectations.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Verifies that all injected failures were handed out.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            let apis: Vec<_> = state.expectations.iter().map(|exp| exp.api.as_str()).collect();
            panic!(
                "Not all expectations were met. {} remaining: {:?}",
                apis.len(),
                apis
            );
        }
    }
}

/// Builder for an injected failure.
pub struct ExpectationBuilder {
    api: String,
    state: Arc<Mutex<RecorderState>>,
}

impl ExpectationBuilder {
    /// The next call to the API fails with `error`.
    pub fn return_err(self, error: ProviderError) {
        self.times(1).return_err(error);
    }

    /// The next `n` calls to the API fail.
    pub fn times(self, n: usize) -> RepeatedExpectationBuilder {
        RepeatedExpectationBuilder { inner: self, n }
    }
}

pub struct RepeatedExpectationBuilder {
    inner: ExpectationBuilder,
    n: usize,
}

impl RepeatedExpectationBuilder {
    pub fn return_err(self, error: ProviderError) {
        let mut state = self.inner.state.lock().unwrap();
        for _ in 0..self.n {
            state.expectations.push_back(Expectation {
                api: self.inner.api.clone(),
                error: error.clone(),
            });
        }
    }
}

/// A shared queue of scripted values.
#[derive(Debug)]
pub struct Script<T> {
    values: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for Script<T> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            values: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T> Script<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: T) {
        self.values.lock().unwrap().push_back(value);
    }

    pub fn extend(&self, values: impl IntoIterator<Item = T>) {
        self.values.lock().unwrap().extend(values);
    }

    /// Takes the next scripted value.
    pub fn next(&self) -> Option<T> {
        self.values.lock().unwrap().pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}
