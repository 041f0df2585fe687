//! # Error Rule Sets
//!
//! An [`ErrorRuleSet`] is an ordered list of `(matcher, status)` rules. Classification walks the
//! list and the first matching rule wins; an error no rule matches is a terminal
//! [`HandlerErrorCode::InternalError`], never a silent success.
//!
//! Rule sets are immutable once built. Resource-specific sets are derived from a base with
//! [`ErrorRuleSet::extend`], which places the new rules *in front of* the inherited ones so that
//! the more specific policy is always consulted first:
//!
//! ```rust
//! use reconcile_framework::rules::{ErrorRuleSet, ErrorStatus, DEFAULT_ERROR_RULE_SET};
//! use reconcile_framework::{HandlerErrorCode, ProviderError};
//!
//! let cluster_rules = ErrorRuleSet::extend(&DEFAULT_ERROR_RULE_SET)
//!     .with_error_codes(
//!         ErrorStatus::fail_with(HandlerErrorCode::NotFound),
//!         &["DBClusterNotFoundFault"],
//!     )
//!     .build();
//!
//! let error = ProviderError::new("DBClusterNotFoundFault", "cluster not found");
//! assert_eq!(cluster_rules.classify(&error), ErrorStatus::Fail(HandlerErrorCode::NotFound));
//!
//! // The base is untouched.
//! assert_eq!(
//!     DEFAULT_ERROR_RULE_SET.classify(&error),
//!     ErrorStatus::Fail(HandlerErrorCode::InternalError)
//! );
//! ```

use crate::error::{HandlerErrorCode, ProviderError};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// Well-known service error codes understood by the default rule set.
pub mod codes {
    pub const NOT_FOUND: &str = "NotFound";
    pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
    pub const THROTTLING: &str = "Throttling";
    pub const THROTTLING_EXCEPTION: &str = "ThrottlingException";
    pub const REQUEST_LIMIT_EXCEEDED: &str = "RequestLimitExceeded";
    pub const CONFLICT: &str = "ConflictException";
    pub const OPERATION_IN_PROGRESS: &str = "OperationInProgress";
    pub const ACCESS_DENIED: &str = "AccessDenied";
    pub const ACCESS_DENIED_EXCEPTION: &str = "AccessDeniedException";
    pub const NOT_AUTHORIZED: &str = "NotAuthorized";
    pub const LIMIT_EXCEEDED: &str = "LimitExceededException";
    pub const SERVICE_QUOTA_EXCEEDED: &str = "ServiceQuotaExceededException";
    pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";
    pub const INVALID_PARAMETER_COMBINATION: &str = "InvalidParameterCombination";
    pub const MISSING_PARAMETER: &str = "MissingParameter";
    pub const VALIDATION_ERROR: &str = "ValidationError";
    pub const INTERNAL_FAILURE: &str = "InternalFailure";
}

/// What a matched rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Terminal failure with this code.
    Fail(HandlerErrorCode),
    /// Transient failure; re-invoke after the backoff delay.
    Retry(HandlerErrorCode),
    /// Swallow the error and let the pipeline continue.
    Ignore,
}

impl ErrorStatus {
    pub fn fail_with(code: HandlerErrorCode) -> Self {
        ErrorStatus::Fail(code)
    }

    pub fn retry_with(code: HandlerErrorCode) -> Self {
        ErrorStatus::Retry(code)
    }

    pub fn ignore() -> Self {
        ErrorStatus::Ignore
    }
}

#[derive(Clone)]
pub enum ErrorMatcher {
    /// Matches the provider error code exactly.
    Code(Cow<'static, str>),
    Predicate(fn(&ProviderError) -> bool),
}

impl ErrorMatcher {
    pub fn matches(&self, error: &ProviderError) -> bool {
        match self {
            ErrorMatcher::Code(code) => error.code == *code,
            ErrorMatcher::Predicate(predicate) => predicate(error),
        }
    }
}

impl fmt::Debug for ErrorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMatcher::Code(code) => f.debug_tuple("Code").field(code).finish(),
            ErrorMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorRule {
    pub matcher: ErrorMatcher,
    pub status: ErrorStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorRuleSet {
    rules: Vec<ErrorRule>,
}

impl ErrorRuleSet {
    pub fn builder() -> ErrorRuleSetBuilder {
        ErrorRuleSetBuilder {
            rules: Vec::new(),
            base: Vec::new(),
        }
    }

    /// Starts a derived rule set whose own rules are consulted before those of `base`.
    pub fn extend(base: &ErrorRuleSet) -> ErrorRuleSetBuilder {
        ErrorRuleSetBuilder {
            rules: Vec::new(),
            base: base.rules.clone(),
        }
    }

    /// Returns a new rule set that consults `specific` first and then `self`.
    pub fn extend_with(&self, specific: &ErrorRuleSet) -> ErrorRuleSet {
        ErrorRuleSet::extend(self)
            .with_rules(specific.rules.iter().cloned())
            .build()
    }

    /// The status of the first matching rule, if any.
    pub fn find(&self, error: &ProviderError) -> Option<ErrorStatus> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(error))
            .map(|rule| rule.status)
    }

    pub fn classify(&self, error: &ProviderError) -> ErrorStatus {
        self.find(error)
            .unwrap_or(ErrorStatus::Fail(HandlerErrorCode::InternalError))
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    /// Every error code registered by a [`ErrorMatcher::Code`] rule, in evaluation order.
    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().filter_map(|rule| match &rule.matcher {
            ErrorMatcher::Code(code) => Some(code.as_ref()),
            ErrorMatcher::Predicate(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub struct ErrorRuleSetBuilder {
    rules: Vec<ErrorRule>,
    base: Vec<ErrorRule>,
}

impl ErrorRuleSetBuilder {
    pub fn with_error_codes(mut self, status: ErrorStatus, codes: &[&'static str]) -> Self {
        self.rules.extend(codes.iter().map(|code| ErrorRule {
            matcher: ErrorMatcher::Code(Cow::Borrowed(*code)),
            status,
        }));
        self
    }

    pub fn with_predicate(mut self, status: ErrorStatus, predicate: fn(&ProviderError) -> bool) -> Self {
        self.rules.push(ErrorRule {
            matcher: ErrorMatcher::Predicate(predicate),
            status,
        });
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = ErrorRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> ErrorRuleSet {
        let mut rules = self.rules;
        rules.extend(self.base);
        ErrorRuleSet { rules }
    }
}

/// Generic conditions shared by every resource type.
pub static DEFAULT_ERROR_RULE_SET: LazyLock<ErrorRuleSet> = LazyLock::new(|| {
    ErrorRuleSet::builder()
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::NotFound),
            &[codes::NOT_FOUND, codes::RESOURCE_NOT_FOUND],
        )
        .with_error_codes(
            ErrorStatus::retry_with(HandlerErrorCode::Throttling),
            &[
                codes::THROTTLING,
                codes::THROTTLING_EXCEPTION,
                codes::REQUEST_LIMIT_EXCEEDED,
            ],
        )
        .with_error_codes(
            ErrorStatus::retry_with(HandlerErrorCode::ResourceConflict),
            &[codes::CONFLICT, codes::OPERATION_IN_PROGRESS],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::AccessDenied),
            &[
                codes::ACCESS_DENIED,
                codes::ACCESS_DENIED_EXCEPTION,
                codes::NOT_AUTHORIZED,
            ],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::ServiceLimitExceeded),
            &[codes::LIMIT_EXCEEDED, codes::SERVICE_QUOTA_EXCEEDED],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::InvalidRequest),
            &[
                codes::INVALID_PARAMETER_VALUE,
                codes::INVALID_PARAMETER_COMBINATION,
                codes::MISSING_PARAMETER,
                codes::VALIDATION_ERROR,
            ],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::InternalError),
            &[codes::INTERNAL_FAILURE],
        )
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn error(code: &str) -> ProviderError {
        ProviderError::new(code, "test")
    }

    #[test]
    fn test_default_rule_set_categories() {
        let rules = &*DEFAULT_ERROR_RULE_SET;
        assert_eq!(
            rules.classify(&error("ResourceNotFoundException")),
            ErrorStatus::Fail(HandlerErrorCode::NotFound)
        );
        assert_eq!(
            rules.classify(&error("ThrottlingException")),
            ErrorStatus::Retry(HandlerErrorCode::Throttling)
        );
        assert_eq!(
            rules.classify(&error("OperationInProgress")),
            ErrorStatus::Retry(HandlerErrorCode::ResourceConflict)
        );
        assert_eq!(
            rules.classify(&error("AccessDeniedException")),
            ErrorStatus::Fail(HandlerErrorCode::AccessDenied)
        );
        assert_eq!(
            rules.classify(&error("ServiceQuotaExceededException")),
            ErrorStatus::Fail(HandlerErrorCode::ServiceLimitExceeded)
        );
    }

    #[test]
    fn test_unregistered_code_is_internal_error() {
        assert_eq!(DEFAULT_ERROR_RULE_SET.find(&error("SomethingOdd")), None);
        assert_eq!(
            DEFAULT_ERROR_RULE_SET.classify(&error("SomethingOdd")),
            ErrorStatus::Fail(HandlerErrorCode::InternalError)
        );
    }

    #[test]
    fn test_extend_consults_specific_rules_first() {
        // Re-map a code the base already knows.
        let derived = ErrorRuleSet::extend(&DEFAULT_ERROR_RULE_SET)
            .with_error_codes(
                ErrorStatus::fail_with(HandlerErrorCode::InvalidRequest),
                &[codes::THROTTLING],
            )
            .build();

        assert_eq!(
            derived.classify(&error(codes::THROTTLING)),
            ErrorStatus::Fail(HandlerErrorCode::InvalidRequest)
        );
        assert_eq!(
            DEFAULT_ERROR_RULE_SET.classify(&error(codes::THROTTLING)),
            ErrorStatus::Retry(HandlerErrorCode::Throttling)
        );
        assert_eq!(derived.len(), DEFAULT_ERROR_RULE_SET.len() + 1);
        assert_eq!(derived.codes().next(), Some(codes::THROTTLING));
    }

    #[test]
    fn test_extend_with_prefers_the_argument() {
        let base = ErrorRuleSet::builder()
            .with_error_codes(ErrorStatus::fail_with(HandlerErrorCode::AccessDenied), &["X"])
            .build();
        let specific = ErrorRuleSet::builder()
            .with_error_codes(ErrorStatus::ignore(), &["X"])
            .build();

        let combined = base.extend_with(&specific);

        assert_eq!(combined.classify(&error("X")), ErrorStatus::Ignore);
        assert_eq!(base.classify(&error("X")), ErrorStatus::Fail(HandlerErrorCode::AccessDenied));
    }

    #[test]
    fn test_predicate_rules() {
        let rules = ErrorRuleSet::builder()
            .with_predicate(ErrorStatus::retry_with(HandlerErrorCode::Throttling), |e| {
                e.message.contains("Rate exceeded")
            })
            .build();

        assert_eq!(
            rules.classify(&ProviderError::new("Whatever", "Rate exceeded for account")),
            ErrorStatus::Retry(HandlerErrorCode::Throttling)
        );
        assert_eq!(rules.codes().count(), 0);
    }

    #[test]
    fn test_every_registered_default_code_has_exactly_one_status() {
        for code in DEFAULT_ERROR_RULE_SET.codes() {
            let matching: Vec<_> = DEFAULT_ERROR_RULE_SET
                .rules()
                .iter()
                .filter(|rule| rule.matcher.matches(&error(code)))
                .collect();
            assert_eq!(matching.len(), 1, "code {code} is registered more than once");
        }
    }
}
