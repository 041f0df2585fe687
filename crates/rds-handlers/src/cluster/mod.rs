//! # DB Cluster
//!
//! Handler for `AWS::RDS::DBCluster`, covering the subset of properties in
//! [`DbCluster`](crate::model::DbCluster).
//!
//! Every mutation is asynchronous on the service side. Create, modify and delete each wait for
//! the cluster to settle, one status check per invocation:
//!
//! ```text
//! create:  CreateDBCluster -> available?  -> read
//! update:  tags -> ModifyDBCluster (if anything changed) -> available? -> read
//! delete:  DeleteDBCluster -> gone?
//! ```
//!
//! A cluster that lands in `failed`, `incompatible-parameters` or
//! `inaccessible-encryption-credentials` fails the operation with `NotStabilized` right away.

pub mod handler;
pub mod status;
pub mod translator;

pub use handler::ClusterHandler;
pub use status::ClusterStatus;

use crate::api::faults;
use crate::model::DbCluster;
use reconcile_framework::{
    Backoff, ErrorRuleSet, ErrorStatus, HandlerClient, HandlerConfig, HandlerErrorCode, HandlerService,
    DEFAULT_ERROR_RULE_SET,
};
use std::sync::LazyLock;
use std::time::Duration;

pub static CLUSTER_RULES: LazyLock<ErrorRuleSet> = LazyLock::new(|| {
    ErrorRuleSet::extend(&DEFAULT_ERROR_RULE_SET)
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::AlreadyExists),
            &[faults::DB_CLUSTER_ALREADY_EXISTS],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::NotFound),
            &[faults::DB_CLUSTER_NOT_FOUND],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::ServiceLimitExceeded),
            &[faults::DB_CLUSTER_QUOTA_EXCEEDED, faults::STORAGE_QUOTA_EXCEEDED],
        )
        .with_error_codes(
            ErrorStatus::retry_with(HandlerErrorCode::ResourceConflict),
            &[faults::INVALID_DB_CLUSTER_STATE],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::InvalidRequest),
            &[
                faults::DB_SUBNET_GROUP_NOT_FOUND,
                faults::INVALID_VPC_NETWORK_STATE,
                faults::INVALID_SUBNET,
                faults::KMS_KEY_NOT_ACCESSIBLE,
                faults::DB_CLUSTER_PARAMETER_GROUP_NOT_FOUND,
            ],
        )
        .build()
});

/// 30 s between invocations, 3 hours to stabilize.
pub fn config() -> HandlerConfig {
    HandlerConfig::new(Backoff::constant(Duration::from_secs(30), Duration::from_secs(3 * 60 * 60)))
}

/// Creates a cluster handler service and its client.
pub fn new() -> (HandlerService<ClusterHandler>, HandlerClient<DbCluster>) {
    HandlerService::new(32, ClusterHandler::new(config().with_env_overrides()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile_framework::ProviderError;

    #[test]
    fn test_every_cluster_fault_is_classified() {
        let specific = CLUSTER_RULES.len() - DEFAULT_ERROR_RULE_SET.len();
        for code in CLUSTER_RULES.codes().take(specific) {
            let status = CLUSTER_RULES.classify(&ProviderError::new(code, "x"));
            assert_ne!(status, ErrorStatus::Fail(HandlerErrorCode::InternalError), "{code}");
        }
        assert_eq!(
            CLUSTER_RULES.classify(&ProviderError::new(faults::INVALID_DB_CLUSTER_STATE, "busy")),
            ErrorStatus::Retry(HandlerErrorCode::ResourceConflict)
        );
        assert_eq!(
            CLUSTER_RULES.classify(&ProviderError::new("SomethingNew", "x")),
            ErrorStatus::Fail(HandlerErrorCode::InternalError)
        );
    }
}
