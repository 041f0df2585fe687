//! # Provisioning Clients
//!
//! [`RdsClient`] is the boundary between the handlers and the RDS API. Every call returns a
//! [`ProviderError`] carrying the service fault code on failure; classification happens in the
//! handler that made the call.
//!
//! [`InMemoryRds`] is a stateful stand-in used by tests and the demo binary.

mod in_memory;

pub use in_memory::{calls, InMemoryRds, InMemoryRdsBuilder};

use crate::api::{
    CreateCustomDbEngineVersionRequest, CreateDbClusterParameterGroupRequest, CreateDbClusterRequest,
    DbClusterInfo, DbClusterParameterGroupInfo, DbEngineVersionInfo, DeleteDbClusterRequest,
    ModifyCustomDbEngineVersionRequest, ModifyDbClusterParameterGroupRequest, ModifyDbClusterRequest,
    Parameter, ResetDbClusterParameterGroupRequest,
};
use crate::model::Tag;
use async_trait::async_trait;
use reconcile_framework::{ProviderError, TaggingClient};

#[async_trait]
pub trait RdsClient: TaggingClient {
    // --- Parameter groups ---

    async fn create_db_cluster_parameter_group(
        &self,
        request: CreateDbClusterParameterGroupRequest,
    ) -> Result<DbClusterParameterGroupInfo, ProviderError>;

    async fn describe_db_cluster_parameter_groups(
        &self,
        name: &str,
    ) -> Result<DbClusterParameterGroupInfo, ProviderError>;

    /// Parameters whose value was set by the user.
    async fn describe_db_cluster_parameters(&self, name: &str) -> Result<Vec<Parameter>, ProviderError>;

    async fn modify_db_cluster_parameter_group(
        &self,
        request: ModifyDbClusterParameterGroupRequest,
    ) -> Result<(), ProviderError>;

    async fn reset_db_cluster_parameter_group(
        &self,
        request: ResetDbClusterParameterGroupRequest,
    ) -> Result<(), ProviderError>;

    async fn delete_db_cluster_parameter_group(&self, name: &str) -> Result<(), ProviderError>;

    // --- Custom engine versions ---

    async fn create_custom_db_engine_version(
        &self,
        request: CreateCustomDbEngineVersionRequest,
    ) -> Result<DbEngineVersionInfo, ProviderError>;

    /// An empty list when no such version exists.
    async fn describe_db_engine_versions(
        &self,
        engine: &str,
        engine_version: &str,
    ) -> Result<Vec<DbEngineVersionInfo>, ProviderError>;

    async fn modify_custom_db_engine_version(
        &self,
        request: ModifyCustomDbEngineVersionRequest,
    ) -> Result<DbEngineVersionInfo, ProviderError>;

    async fn delete_custom_db_engine_version(
        &self,
        engine: &str,
        engine_version: &str,
    ) -> Result<DbEngineVersionInfo, ProviderError>;

    // --- Clusters ---

    async fn create_db_cluster(&self, request: CreateDbClusterRequest) -> Result<DbClusterInfo, ProviderError>;

    async fn describe_db_clusters(&self, identifier: &str) -> Result<DbClusterInfo, ProviderError>;

    async fn modify_db_cluster(&self, request: ModifyDbClusterRequest) -> Result<DbClusterInfo, ProviderError>;

    async fn delete_db_cluster(&self, request: DeleteDbClusterRequest) -> Result<DbClusterInfo, ProviderError>;

    // --- Tags ---

    async fn list_tags_for_resource(&self, arn: &str) -> Result<Vec<Tag>, ProviderError>;
}
