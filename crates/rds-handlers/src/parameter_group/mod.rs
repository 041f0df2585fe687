//! # DB Cluster Parameter Group
//!
//! Handler for `AWS::RDS::DBClusterParameterGroup`.
//!
//! ## Structure
//!
//! - [`handler`] - [`ParameterGroupHandler`], the create/read/update/delete pipelines
//! - [`translator`] - model to API request conversions, parameter batching
//! - [`PARAMETER_GROUP_RULES`] - fault classification on top of the default rule set
//! - [`new()`] - factory that creates the handler service and its client
//!
//! ## Usage
//!
//! ```rust
//! use rds_handlers::clients::{InMemoryRds, RdsClient};
//! use rds_handlers::model::DbClusterParameterGroup;
//! use rds_handlers::parameter_group;
//! use reconcile_framework::{HandlerRequest, OperationType};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (service, client) = parameter_group::new();
//!     let rds: Arc<dyn RdsClient> = Arc::new(InMemoryRds::new());
//!     tokio::spawn(service.run(rds));
//!
//!     let model = DbClusterParameterGroup::new("aurora-postgresql14", "tuned")
//!         .with_name("tuned-pg")
//!         .with_parameter("work_mem", "65536");
//!     let event = client
//!         .handle(OperationType::Create, HandlerRequest::new(model, "token-1"), None)
//!         .await?;
//!
//!     assert!(event.is_success());
//!     Ok(())
//! }
//! ```

pub mod handler;
pub mod translator;

pub use handler::{ParameterGroupHandler, UpdatePhase};

use crate::api::faults;
use crate::model::DbClusterParameterGroup;
use reconcile_framework::{
    Backoff, ErrorRuleSet, ErrorStatus, HandlerClient, HandlerConfig, HandlerErrorCode, HandlerService,
    DEFAULT_ERROR_RULE_SET,
};
use std::sync::LazyLock;
use std::time::Duration;

pub static PARAMETER_GROUP_RULES: LazyLock<ErrorRuleSet> = LazyLock::new(|| {
    ErrorRuleSet::extend(&DEFAULT_ERROR_RULE_SET)
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::AlreadyExists),
            &[faults::DB_PARAMETER_GROUP_ALREADY_EXISTS],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::NotFound),
            &[faults::DB_PARAMETER_GROUP_NOT_FOUND],
        )
        .with_error_codes(
            ErrorStatus::fail_with(HandlerErrorCode::ServiceLimitExceeded),
            &[faults::DB_PARAMETER_GROUP_QUOTA_EXCEEDED],
        )
        .with_error_codes(
            ErrorStatus::retry_with(HandlerErrorCode::ResourceConflict),
            &[faults::INVALID_DB_PARAMETER_GROUP_STATE],
        )
        .build()
});

/// 5 s between invocations, 30 minutes to stabilize.
pub fn config() -> HandlerConfig {
    HandlerConfig::new(Backoff::constant(Duration::from_secs(5), Duration::from_secs(30 * 60)))
}

/// Creates a parameter group handler service and its client.
pub fn new() -> (HandlerService<ParameterGroupHandler>, HandlerClient<DbClusterParameterGroup>) {
    HandlerService::new(32, ParameterGroupHandler::new(config().with_env_overrides()))
}
