//! # In-Memory RDS
//!
//! A stateful fake of the RDS API. Mutations behave asynchronously the way the real service
//! does: a new or modified resource reports a transitional status (`creating`, `modifying`,
//! `deleting`) until it has been described `settle_after` more times, then settles.
//! A deleted resource disappears once it settles.
//!
//! Every call is logged in a [`CallRecorder`] first, so tests can count calls and inject faults:
//!
//! ```rust
//! use rds_handlers::clients::{calls, InMemoryRds, RdsClient};
//! use reconcile_framework::ProviderError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let rds = InMemoryRds::new();
//! rds.recorder()
//!     .expect(calls::DESCRIBE_DB_CLUSTERS)
//!     .return_err(ProviderError::new("ThrottlingException", "Rate exceeded"));
//!
//! assert!(rds.describe_db_clusters("db-1").await.is_err());
//! assert_eq!(rds.recorder().count(calls::DESCRIBE_DB_CLUSTERS), 1);
//! # }
//! ```

use super::RdsClient;
use crate::api::{
    faults, CreateCustomDbEngineVersionRequest, CreateDbClusterParameterGroupRequest, CreateDbClusterRequest,
    DbClusterInfo, DbClusterParameterGroupInfo, DbEngineVersionInfo, DeleteDbClusterRequest,
    ModifyCustomDbEngineVersionRequest, ModifyDbClusterParameterGroupRequest, ModifyDbClusterRequest,
    Parameter, ResetDbClusterParameterGroupRequest, ScalingConfiguration, ScalingConfigurationInfo,
    DomainMembership, MAX_PARAMETERS_PER_REQUEST,
};
use crate::model::{tags_from_map, tags_to_map, Tag};
use async_trait::async_trait;
use reconcile_framework::mock::{CallRecorder, Script};
use reconcile_framework::rules::codes;
use reconcile_framework::{ProviderError, TaggingClient, Tags};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// API names as recorded by the [`CallRecorder`].
pub mod calls {
    pub const CREATE_DB_CLUSTER_PARAMETER_GROUP: &str = "CreateDBClusterParameterGroup";
    pub const DESCRIBE_DB_CLUSTER_PARAMETER_GROUPS: &str = "DescribeDBClusterParameterGroups";
    pub const DESCRIBE_DB_CLUSTER_PARAMETERS: &str = "DescribeDBClusterParameters";
    pub const MODIFY_DB_CLUSTER_PARAMETER_GROUP: &str = "ModifyDBClusterParameterGroup";
    pub const RESET_DB_CLUSTER_PARAMETER_GROUP: &str = "ResetDBClusterParameterGroup";
    pub const DELETE_DB_CLUSTER_PARAMETER_GROUP: &str = "DeleteDBClusterParameterGroup";
    pub const CREATE_CUSTOM_DB_ENGINE_VERSION: &str = "CreateCustomDBEngineVersion";
    pub const DESCRIBE_DB_ENGINE_VERSIONS: &str = "DescribeDBEngineVersions";
    pub const MODIFY_CUSTOM_DB_ENGINE_VERSION: &str = "ModifyCustomDBEngineVersion";
    pub const DELETE_CUSTOM_DB_ENGINE_VERSION: &str = "DeleteCustomDBEngineVersion";
    pub const CREATE_DB_CLUSTER: &str = "CreateDBCluster";
    pub const DESCRIBE_DB_CLUSTERS: &str = "DescribeDBClusters";
    pub const MODIFY_DB_CLUSTER: &str = "ModifyDBCluster";
    pub const DELETE_DB_CLUSTER: &str = "DeleteDBCluster";
    pub const LIST_TAGS_FOR_RESOURCE: &str = "ListTagsForResource";
    pub const ADD_TAGS_TO_RESOURCE: &str = "AddTagsToResource";
    pub const REMOVE_TAGS_FROM_RESOURCE: &str = "RemoveTagsFromResource";
}

const ARN_PREFIX: &str = "arn:aws:rds:us-east-1:123456789012";

struct Tracked<T> {
    info: T,
    /// Describes left before the current status settles.
    pending: u32,
}

#[derive(Default)]
struct State {
    parameter_groups: BTreeMap<String, Tracked<DbClusterParameterGroupInfo>>,
    parameters: BTreeMap<String, BTreeMap<String, Parameter>>,
    engine_versions: BTreeMap<(String, String), Tracked<DbEngineVersionInfo>>,
    clusters: BTreeMap<String, Tracked<DbClusterInfo>>,
    tags: BTreeMap<String, Tags>,
}

pub struct InMemoryRds {
    state: Mutex<State>,
    recorder: CallRecorder,
    cluster_statuses: Script<String>,
    engine_version_statuses: Script<String>,
    settle_after: u32,
}

#[derive(Default)]
pub struct InMemoryRdsBuilder {
    settle_after: u32,
    recorder: Option<CallRecorder>,
}

impl InMemoryRdsBuilder {
    /// Number of describe calls a transitional status survives.
    pub fn settle_after(mut self, describes: u32) -> Self {
        self.settle_after = describes;
        self
    }

    /// Shares an existing recorder.
    pub fn recorder(mut self, recorder: CallRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn build(self) -> InMemoryRds {
        InMemoryRds {
            state: Mutex::new(State::default()),
            recorder: self.recorder.unwrap_or_default(),
            cluster_statuses: Script::new(),
            engine_version_statuses: Script::new(),
            settle_after: self.settle_after,
        }
    }
}

impl Default for InMemoryRds {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRds {
    /// Resources settle on the first describe after a mutation.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InMemoryRdsBuilder {
        InMemoryRdsBuilder::default()
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    /// Statuses handed out by the next cluster describes, ahead of the simulated lifecycle.
    pub fn cluster_statuses(&self) -> &Script<String> {
        &self.cluster_statuses
    }

    /// Statuses handed out by the next engine version describes.
    pub fn engine_version_statuses(&self) -> &Script<String> {
        &self.engine_version_statuses
    }

    /// The user-set parameters of a parameter group.
    pub fn parameters_of(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.lock().parameters.get(name).map(|params| {
            params
                .values()
                .map(|p| (p.parameter_name.clone(), p.parameter_value.clone()))
                .collect()
        })
    }

    pub fn tags_of(&self, arn: &str) -> Tags {
        self.lock().tags.get(arn).cloned().unwrap_or_default()
    }

    pub fn cluster(&self, identifier: &str) -> Option<DbClusterInfo> {
        self.lock().clusters.get(identifier).map(|tracked| tracked.info.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tracked<T>(&self, info: T) -> Tracked<T> {
        Tracked {
            info,
            pending: self.settle_after,
        }
    }
}

fn not_found(code: &str, what: &str) -> ProviderError {
    ProviderError::new(code, format!("{what} not found"))
}

/// Advances a transitional status by one describe. Returns `false` once a deletion settled.
fn settle(status: &mut String, pending: &mut u32) -> bool {
    if *pending > 0 {
        *pending -= 1;
        return true;
    }
    match status.as_str() {
        "deleting" => false,
        "creating" | "modifying" | "pending-validation" | "validating" => {
            *status = "available".to_string();
            true
        }
        _ => true,
    }
}

fn scaling_info(config: &Option<ScalingConfiguration>) -> Option<ScalingConfigurationInfo> {
    config.as_ref().map(|c| ScalingConfigurationInfo {
        auto_pause: c.auto_pause,
        min_capacity: c.min_capacity,
        max_capacity: c.max_capacity,
        seconds_until_auto_pause: c.seconds_until_auto_pause,
        seconds_before_timeout: c.seconds_before_timeout,
        timeout_action: c.timeout_action.clone(),
    })
}

fn default_port(engine: &str) -> u16 {
    if engine.contains("postgres") {
        5432
    } else {
        3306
    }
}

#[async_trait]
impl TaggingClient for InMemoryRds {
    async fn add_tags(&self, arn: &str, tags: &Tags) -> Result<(), ProviderError> {
        self.recorder.record(calls::ADD_TAGS_TO_RESOURCE)?;
        debug!(arn, ?tags, "AddTagsToResource");
        self.lock()
            .tags
            .entry(arn.to_string())
            .or_default()
            .extend(tags.clone());
        Ok(())
    }

    async fn remove_tags(&self, arn: &str, keys: &BTreeSet<String>) -> Result<(), ProviderError> {
        self.recorder.record(calls::REMOVE_TAGS_FROM_RESOURCE)?;
        debug!(arn, ?keys, "RemoveTagsFromResource");
        if let Some(tags) = self.lock().tags.get_mut(arn) {
            tags.retain(|key, _| !keys.contains(key));
        }
        Ok(())
    }
}

#[async_trait]
impl RdsClient for InMemoryRds {
    async fn create_db_cluster_parameter_group(
        &self,
        request: CreateDbClusterParameterGroupRequest,
    ) -> Result<DbClusterParameterGroupInfo, ProviderError> {
        self.recorder.record(calls::CREATE_DB_CLUSTER_PARAMETER_GROUP)?;
        let name = request.db_cluster_parameter_group_name;
        let mut state = self.lock();
        if state.parameter_groups.contains_key(&name) {
            return Err(ProviderError::new(
                faults::DB_PARAMETER_GROUP_ALREADY_EXISTS,
                format!("Parameter group {name} already exists"),
            ));
        }
        let info = DbClusterParameterGroupInfo {
            db_cluster_parameter_group_arn: format!("{ARN_PREFIX}:cluster-pg:{name}"),
            db_cluster_parameter_group_name: name.clone(),
            db_parameter_group_family: request.db_parameter_group_family,
            description: request.description,
        };
        state
            .tags
            .insert(info.db_cluster_parameter_group_arn.clone(), tags_to_map(&request.tags));
        state.parameters.insert(name.clone(), BTreeMap::new());
        state.parameter_groups.insert(name, Tracked { info: info.clone(), pending: 0 });
        Ok(info)
    }

    async fn describe_db_cluster_parameter_groups(
        &self,
        name: &str,
    ) -> Result<DbClusterParameterGroupInfo, ProviderError> {
        self.recorder.record(calls::DESCRIBE_DB_CLUSTER_PARAMETER_GROUPS)?;
        self.lock()
            .parameter_groups
            .get(name)
            .map(|tracked| tracked.info.clone())
            .ok_or_else(|| not_found(faults::DB_PARAMETER_GROUP_NOT_FOUND, name))
    }

    async fn describe_db_cluster_parameters(&self, name: &str) -> Result<Vec<Parameter>, ProviderError> {
        self.recorder.record(calls::DESCRIBE_DB_CLUSTER_PARAMETERS)?;
        self.lock()
            .parameters
            .get(name)
            .map(|params| params.values().cloned().collect())
            .ok_or_else(|| not_found(faults::DB_PARAMETER_GROUP_NOT_FOUND, name))
    }

    async fn modify_db_cluster_parameter_group(
        &self,
        request: ModifyDbClusterParameterGroupRequest,
    ) -> Result<(), ProviderError> {
        self.recorder.record(calls::MODIFY_DB_CLUSTER_PARAMETER_GROUP)?;
        if request.parameters.len() > MAX_PARAMETERS_PER_REQUEST {
            return Err(ProviderError::new(
                codes::INVALID_PARAMETER_VALUE,
                format!("At most {MAX_PARAMETERS_PER_REQUEST} parameters per request"),
            ));
        }
        let name = &request.db_cluster_parameter_group_name;
        let mut state = self.lock();
        let params = state
            .parameters
            .get_mut(name)
            .ok_or_else(|| not_found(faults::DB_PARAMETER_GROUP_NOT_FOUND, name))?;
        for parameter in request.parameters {
            params.insert(parameter.parameter_name.clone(), parameter);
        }
        Ok(())
    }

    async fn reset_db_cluster_parameter_group(
        &self,
        request: ResetDbClusterParameterGroupRequest,
    ) -> Result<(), ProviderError> {
        self.recorder.record(calls::RESET_DB_CLUSTER_PARAMETER_GROUP)?;
        let name = &request.db_cluster_parameter_group_name;
        let mut state = self.lock();
        let params = state
            .parameters
            .get_mut(name)
            .ok_or_else(|| not_found(faults::DB_PARAMETER_GROUP_NOT_FOUND, name))?;
        if request.reset_all_parameters {
            params.clear();
        } else {
            for parameter in &request.parameters {
                params.remove(&parameter.parameter_name);
            }
        }
        Ok(())
    }

    async fn delete_db_cluster_parameter_group(&self, name: &str) -> Result<(), ProviderError> {
        self.recorder.record(calls::DELETE_DB_CLUSTER_PARAMETER_GROUP)?;
        let mut state = self.lock();
        let tracked = state
            .parameter_groups
            .remove(name)
            .ok_or_else(|| not_found(faults::DB_PARAMETER_GROUP_NOT_FOUND, name))?;
        state.parameters.remove(name);
        state.tags.remove(&tracked.info.db_cluster_parameter_group_arn);
        Ok(())
    }

    async fn create_custom_db_engine_version(
        &self,
        request: CreateCustomDbEngineVersionRequest,
    ) -> Result<DbEngineVersionInfo, ProviderError> {
        self.recorder.record(calls::CREATE_CUSTOM_DB_ENGINE_VERSION)?;
        let key = (request.engine.clone(), request.engine_version.clone());
        let mut state = self.lock();
        if state.engine_versions.contains_key(&key) {
            return Err(ProviderError::new(
                faults::CUSTOM_DB_ENGINE_VERSION_ALREADY_EXISTS,
                format!("Custom engine version {}:{} already exists", key.0, key.1),
            ));
        }
        let info = DbEngineVersionInfo {
            db_engine_version_arn: format!("{ARN_PREFIX}:cev:{}/{}", key.0, key.1),
            engine: request.engine,
            engine_version: request.engine_version,
            database_installation_files_s3_bucket_name: request.database_installation_files_s3_bucket_name,
            database_installation_files_s3_prefix: request.database_installation_files_s3_prefix,
            db_engine_version_description: request.description,
            kms_key_id: request.kms_key_id,
            custom_db_engine_version_manifest: request.manifest,
            status: "creating".to_string(),
        };
        state
            .tags
            .insert(info.db_engine_version_arn.clone(), tags_to_map(&request.tags));
        let tracked = self.tracked(info.clone());
        state.engine_versions.insert(key, tracked);
        Ok(info)
    }

    async fn describe_db_engine_versions(
        &self,
        engine: &str,
        engine_version: &str,
    ) -> Result<Vec<DbEngineVersionInfo>, ProviderError> {
        self.recorder.record(calls::DESCRIBE_DB_ENGINE_VERSIONS)?;
        let key = (engine.to_string(), engine_version.to_string());
        let scripted = self.engine_version_statuses.next();
        let mut state = self.lock();
        let Some(tracked) = state.engine_versions.get_mut(&key) else {
            return Ok(Vec::new());
        };
        if let Some(status) = scripted {
            tracked.info.status = status;
        } else if !settle(&mut tracked.info.status, &mut tracked.pending) {
            let arn = tracked.info.db_engine_version_arn.clone();
            state.engine_versions.remove(&key);
            state.tags.remove(&arn);
            return Ok(Vec::new());
        }
        Ok(vec![tracked.info.clone()])
    }

    async fn modify_custom_db_engine_version(
        &self,
        request: ModifyCustomDbEngineVersionRequest,
    ) -> Result<DbEngineVersionInfo, ProviderError> {
        self.recorder.record(calls::MODIFY_CUSTOM_DB_ENGINE_VERSION)?;
        let key = (request.engine.clone(), request.engine_version.clone());
        let mut state = self.lock();
        let tracked = state
            .engine_versions
            .get_mut(&key)
            .ok_or_else(|| not_found(faults::CUSTOM_DB_ENGINE_VERSION_NOT_FOUND, &format!("{}:{}", key.0, key.1)))?;
        if !matches!(tracked.info.status.as_str(), "available" | "inactive" | "inactive-except-restore") {
            return Err(ProviderError::new(
                faults::INVALID_CUSTOM_DB_ENGINE_VERSION_STATE,
                format!("Custom engine version is {}", tracked.info.status),
            ));
        }
        if let Some(description) = request.description {
            tracked.info.db_engine_version_description = Some(description);
        }
        if let Some(status) = request.status {
            tracked.info.status = status;
        }
        Ok(tracked.info.clone())
    }

    async fn delete_custom_db_engine_version(
        &self,
        engine: &str,
        engine_version: &str,
    ) -> Result<DbEngineVersionInfo, ProviderError> {
        self.recorder.record(calls::DELETE_CUSTOM_DB_ENGINE_VERSION)?;
        let key = (engine.to_string(), engine_version.to_string());
        let settle_after = self.settle_after;
        let mut state = self.lock();
        let tracked = state
            .engine_versions
            .get_mut(&key)
            .ok_or_else(|| not_found(faults::CUSTOM_DB_ENGINE_VERSION_NOT_FOUND, &format!("{engine}:{engine_version}")))?;
        tracked.info.status = "deleting".to_string();
        tracked.pending = settle_after;
        Ok(tracked.info.clone())
    }

    async fn create_db_cluster(&self, request: CreateDbClusterRequest) -> Result<DbClusterInfo, ProviderError> {
        self.recorder.record(calls::CREATE_DB_CLUSTER)?;
        let identifier = request.db_cluster_identifier;
        let mut state = self.lock();
        if state.clusters.contains_key(&identifier) {
            return Err(ProviderError::new(
                faults::DB_CLUSTER_ALREADY_EXISTS,
                format!("DB cluster {identifier} already exists"),
            ));
        }
        if let Some(group) = &request.db_cluster_parameter_group_name {
            if !state.parameter_groups.contains_key(group) {
                return Err(not_found(faults::DB_CLUSTER_PARAMETER_GROUP_NOT_FOUND, group));
            }
        }
        let info = DbClusterInfo {
            db_cluster_arn: format!("{ARN_PREFIX}:cluster:{identifier}"),
            endpoint: Some(format!("{identifier}.cluster-abc123.us-east-1.rds.amazonaws.com")),
            reader_endpoint: Some(format!("{identifier}.cluster-ro-abc123.us-east-1.rds.amazonaws.com")),
            port: Some(request.port.unwrap_or_else(|| default_port(&request.engine))),
            db_cluster_identifier: identifier.clone(),
            engine: request.engine,
            engine_version: request.engine_version,
            status: "creating".to_string(),
            master_username: request.master_username,
            db_cluster_parameter_group: request.db_cluster_parameter_group_name,
            preferred_backup_window: request.preferred_backup_window,
            preferred_maintenance_window: request.preferred_maintenance_window,
            iam_database_authentication_enabled: request.enable_iam_database_authentication,
            scaling_configuration_info: scaling_info(&request.scaling_configuration),
            domain_memberships: request
                .domain
                .map(|domain| DomainMembership {
                    domain: Some(domain),
                    iam_role_name: request.domain_iam_role_name,
                    status: Some("joined".to_string()),
                })
                .into_iter()
                .collect(),
        };
        state.tags.insert(info.db_cluster_arn.clone(), tags_to_map(&request.tags));
        let tracked = self.tracked(info.clone());
        state.clusters.insert(identifier, tracked);
        Ok(info)
    }

    async fn describe_db_clusters(&self, identifier: &str) -> Result<DbClusterInfo, ProviderError> {
        self.recorder.record(calls::DESCRIBE_DB_CLUSTERS)?;
        let scripted = self.cluster_statuses.next();
        let mut state = self.lock();
        let tracked = state
            .clusters
            .get_mut(identifier)
            .ok_or_else(|| not_found(faults::DB_CLUSTER_NOT_FOUND, identifier))?;
        if let Some(status) = scripted {
            tracked.info.status = status;
        } else if !settle(&mut tracked.info.status, &mut tracked.pending) {
            let arn = tracked.info.db_cluster_arn.clone();
            state.clusters.remove(identifier);
            state.tags.remove(&arn);
            return Err(not_found(faults::DB_CLUSTER_NOT_FOUND, identifier));
        }
        Ok(tracked.info.clone())
    }

    async fn modify_db_cluster(&self, request: ModifyDbClusterRequest) -> Result<DbClusterInfo, ProviderError> {
        self.recorder.record(calls::MODIFY_DB_CLUSTER)?;
        let settle_after = self.settle_after;
        let mut state = self.lock();
        let tracked = state
            .clusters
            .get_mut(&request.db_cluster_identifier)
            .ok_or_else(|| not_found(faults::DB_CLUSTER_NOT_FOUND, &request.db_cluster_identifier))?;
        if tracked.info.status != "available" {
            return Err(ProviderError::new(
                faults::INVALID_DB_CLUSTER_STATE,
                format!("DB cluster is {}", tracked.info.status),
            ));
        }
        let info = &mut tracked.info;
        if let Some(version) = request.engine_version {
            info.engine_version = Some(version);
        }
        if let Some(group) = request.db_cluster_parameter_group_name {
            info.db_cluster_parameter_group = Some(group);
        }
        if let Some(window) = request.preferred_backup_window {
            info.preferred_backup_window = Some(window);
        }
        if let Some(window) = request.preferred_maintenance_window {
            info.preferred_maintenance_window = Some(window);
        }
        if let Some(enabled) = request.enable_iam_database_authentication {
            info.iam_database_authentication_enabled = Some(enabled);
        }
        if request.scaling_configuration.is_some() {
            info.scaling_configuration_info = scaling_info(&request.scaling_configuration);
        }
        if let Some(port) = request.port {
            info.port = Some(port);
        }
        if let Some(domain) = request.domain {
            info.domain_memberships = vec![DomainMembership {
                domain: Some(domain),
                iam_role_name: request.domain_iam_role_name,
                status: Some("joined".to_string()),
            }];
        }
        info.status = "modifying".to_string();
        tracked.pending = settle_after;
        Ok(tracked.info.clone())
    }

    async fn delete_db_cluster(&self, request: DeleteDbClusterRequest) -> Result<DbClusterInfo, ProviderError> {
        self.recorder.record(calls::DELETE_DB_CLUSTER)?;
        let settle_after = self.settle_after;
        let mut state = self.lock();
        let tracked = state
            .clusters
            .get_mut(&request.db_cluster_identifier)
            .ok_or_else(|| not_found(faults::DB_CLUSTER_NOT_FOUND, &request.db_cluster_identifier))?;
        tracked.info.status = "deleting".to_string();
        tracked.pending = settle_after;
        Ok(tracked.info.clone())
    }

    async fn list_tags_for_resource(&self, arn: &str) -> Result<Vec<Tag>, ProviderError> {
        self.recorder.record(calls::LIST_TAGS_FOR_RESOURCE)?;
        Ok(self
            .lock()
            .tags
            .get(arn)
            .map(tags_from_map)
            .unwrap_or_default())
    }
}
