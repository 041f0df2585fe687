//! # Custom DB Engine Version
//!
//! Handler for `AWS::RDS::CustomDBEngineVersion`, identified by engine and engine version.
//!
//! - [`handler`] - [`EngineVersionHandler`]
//! - [`status`] - [`EngineVersionStatus`], the status vocabulary used while stabilizing
//! - [`translator`] - model to API request conversions
//!
//! Only the description and the status can be changed in place. The status is how a version is
//! retired: `inactive` keeps existing instances running but refuses new ones.

pub mod handler;
pub mod status;
pub mod translator;

pub use handler::EngineVersionHandler;
pub use status::EngineVersionStatus;

use crate::api::faults;
use crate::model::CustomDbEngineVersion;
use reconcile_framework::{
    Backoff, ErrorRuleSet, ErrorStatus, HandlerClient, HandlerConfig, HandlerErrorCode, HandlerService,
    DEFAULT_ERROR_RULE_SET,
};
use std::sync::LazyLock;
use std::time::Duration;

pub static ENGINE_VERSION_RULES: LazyLock<ErrorRuleSet> = LazyLock::new(|| {
    ErrorRuleSet::extend(&DEFAULT_ERROR_RULE_SET)
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::AlreadyExists),
            &[faults::CUSTOM_DB_ENGINE_VERSION_ALREADY_EXISTS],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::NotFound),
            &[faults::CUSTOM_DB_ENGINE_VERSION_NOT_FOUND],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::InvalidRequest),
            &[faults::KMS_KEY_NOT_ACCESSIBLE, faults::INVALID_S3_BUCKET],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::ServiceLimitExceeded),
            &[faults::CUSTOM_DB_ENGINE_VERSION_QUOTA_EXCEEDED],
        )
        // Tag updates treat this as a soft failure.
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::ResourceConflict),
            &[faults::INVALID_CUSTOM_DB_ENGINE_VERSION_STATE],
        )
        .build()
});

/// 30 s between invocations, 10 hours to stabilize.
pub fn config() -> HandlerConfig {
    HandlerConfig::new(Backoff::constant(Duration::from_secs(30), Duration::from_secs(10 * 60 * 60)))
}

/// Creates a custom engine version handler service and its client.
pub fn new() -> (HandlerService<EngineVersionHandler>, HandlerClient<CustomDbEngineVersion>) {
    HandlerService::new(32, EngineVersionHandler::new(config().with_env_overrides()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile_framework::tagging::tagging_error_status;
    use reconcile_framework::ProviderError;

    #[test]
    fn test_invalid_state_fails_but_is_soft_for_tagging() {
        let busy = ProviderError::new(faults::INVALID_CUSTOM_DB_ENGINE_VERSION_STATE, "creating");

        assert_eq!(
            ENGINE_VERSION_RULES.classify(&busy),
            ErrorStatus::Fail(HandlerErrorCode::ResourceConflict)
        );
        assert_eq!(tagging_error_status(&ENGINE_VERSION_RULES, &busy), ErrorStatus::Ignore);
    }

    #[test]
    fn test_media_errors_are_invalid_requests() {
        for code in [faults::KMS_KEY_NOT_ACCESSIBLE, faults::INVALID_S3_BUCKET] {
            assert_eq!(
                ENGINE_VERSION_RULES.classify(&ProviderError::new(code, "bad media")),
                ErrorStatus::Fail(HandlerErrorCode::InvalidRequest)
            );
        }
    }
}
