//! # RDS API Shapes
//!
//! Request and response shapes of the provisioning API, as seen by [`RdsClient`]. They mirror
//! the service's own field names rather than the resource models; translators convert between
//! the two.
//!
//! [`RdsClient`]: crate::clients::RdsClient

use crate::model::Tag;
use serde::{Deserialize, Serialize};

/// Service fault codes, matched by the resource error rule sets.
pub mod faults {
    pub const DB_PARAMETER_GROUP_ALREADY_EXISTS: &str = "DBParameterGroupAlreadyExists";
    pub const DB_PARAMETER_GROUP_NOT_FOUND: &str = "DBParameterGroupNotFound";
    pub const DB_PARAMETER_GROUP_QUOTA_EXCEEDED: &str = "DBParameterGroupQuotaExceeded";
    pub const INVALID_DB_PARAMETER_GROUP_STATE: &str = "InvalidDBParameterGroupState";

    pub const CUSTOM_DB_ENGINE_VERSION_ALREADY_EXISTS: &str = "CustomDBEngineVersionAlreadyExistsFault";
    pub const CUSTOM_DB_ENGINE_VERSION_NOT_FOUND: &str = "CustomDBEngineVersionNotFoundFault";
    pub const CUSTOM_DB_ENGINE_VERSION_QUOTA_EXCEEDED: &str = "CustomDBEngineVersionQuotaExceededFault";
    pub const INVALID_CUSTOM_DB_ENGINE_VERSION_STATE: &str = "InvalidCustomDBEngineVersionStateFault";
    pub const KMS_KEY_NOT_ACCESSIBLE: &str = "KMSKeyNotAccessibleFault";
    pub const INVALID_S3_BUCKET: &str = "InvalidS3BucketFault";

    pub const DB_CLUSTER_ALREADY_EXISTS: &str = "DBClusterAlreadyExistsFault";
    pub const DB_CLUSTER_NOT_FOUND: &str = "DBClusterNotFoundFault";
    pub const DB_CLUSTER_QUOTA_EXCEEDED: &str = "DBClusterQuotaExceededFault";
    pub const STORAGE_QUOTA_EXCEEDED: &str = "StorageQuotaExceeded";
    pub const INVALID_DB_CLUSTER_STATE: &str = "InvalidDBClusterStateFault";
    pub const DB_SUBNET_GROUP_NOT_FOUND: &str = "DBSubnetGroupNotFoundFault";
    pub const INVALID_VPC_NETWORK_STATE: &str = "InvalidVPCNetworkStateFault";
    pub const INVALID_SUBNET: &str = "InvalidSubnet";
    pub const DB_CLUSTER_PARAMETER_GROUP_NOT_FOUND: &str = "DBClusterParameterGroupNotFound";
}

/// Maximum number of parameters a single modify call accepts.
pub const MAX_PARAMETERS_PER_REQUEST: usize = 20;

// --- Parameter groups ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDbClusterParameterGroupRequest {
    pub db_cluster_parameter_group_name: String,
    pub db_parameter_group_family: String,
    pub description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbClusterParameterGroupInfo {
    pub db_cluster_parameter_group_name: String,
    pub db_parameter_group_family: String,
    pub description: String,
    pub db_cluster_parameter_group_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub parameter_name: String,
    pub parameter_value: String,
    pub apply_method: ApplyMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyMethod {
    Immediate,
    PendingReboot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyDbClusterParameterGroupRequest {
    pub db_cluster_parameter_group_name: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetDbClusterParameterGroupRequest {
    pub db_cluster_parameter_group_name: String,
    pub reset_all_parameters: bool,
    pub parameters: Vec<Parameter>,
}

// --- Custom engine versions ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomDbEngineVersionRequest {
    pub engine: String,
    pub engine_version: String,
    pub database_installation_files_s3_bucket_name: Option<String>,
    pub database_installation_files_s3_prefix: Option<String>,
    pub description: Option<String>,
    pub kms_key_id: Option<String>,
    pub manifest: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbEngineVersionInfo {
    pub engine: String,
    pub engine_version: String,
    pub database_installation_files_s3_bucket_name: Option<String>,
    pub database_installation_files_s3_prefix: Option<String>,
    pub db_engine_version_description: Option<String>,
    pub kms_key_id: Option<String>,
    pub custom_db_engine_version_manifest: Option<String>,
    pub status: String,
    pub db_engine_version_arn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyCustomDbEngineVersionRequest {
    pub engine: String,
    pub engine_version: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl ModifyCustomDbEngineVersionRequest {
    pub fn has_changes(&self) -> bool {
        self.description.is_some() || self.status.is_some()
    }
}

// --- Clusters ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingConfiguration {
    pub auto_pause: Option<bool>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub seconds_until_auto_pause: Option<i32>,
    pub seconds_before_timeout: Option<i32>,
    pub timeout_action: Option<String>,
}

/// Scaling configuration as reported by describe calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingConfigurationInfo {
    pub auto_pause: Option<bool>,
    pub min_capacity: Option<i32>,
    pub max_capacity: Option<i32>,
    pub seconds_until_auto_pause: Option<i32>,
    pub seconds_before_timeout: Option<i32>,
    pub timeout_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMembership {
    pub domain: Option<String>,
    pub iam_role_name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDbClusterRequest {
    pub db_cluster_identifier: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub port: Option<u16>,
    pub master_username: Option<String>,
    pub master_user_password: Option<String>,
    pub db_cluster_parameter_group_name: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub enable_iam_database_authentication: Option<bool>,
    pub scaling_configuration: Option<ScalingConfiguration>,
    pub domain: Option<String>,
    pub domain_iam_role_name: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyDbClusterRequest {
    pub db_cluster_identifier: String,
    pub engine_version: Option<String>,
    pub allow_major_version_upgrade: Option<bool>,
    pub db_cluster_parameter_group_name: Option<String>,
    pub db_instance_parameter_group_name: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub enable_iam_database_authentication: Option<bool>,
    pub scaling_configuration: Option<ScalingConfiguration>,
    pub master_user_password: Option<String>,
    pub port: Option<u16>,
    pub domain: Option<String>,
    pub domain_iam_role_name: Option<String>,
    pub apply_immediately: bool,
}

impl ModifyDbClusterRequest {
    /// Whether anything besides the identifier would be sent.
    pub fn has_changes(&self) -> bool {
        let unchanged = ModifyDbClusterRequest {
            db_cluster_identifier: self.db_cluster_identifier.clone(),
            apply_immediately: self.apply_immediately,
            ..Default::default()
        };
        *self != unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDbClusterRequest {
    pub db_cluster_identifier: String,
    pub skip_final_snapshot: bool,
    pub final_db_snapshot_identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbClusterInfo {
    pub db_cluster_identifier: String,
    pub db_cluster_arn: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub status: String,
    pub port: Option<u16>,
    pub endpoint: Option<String>,
    pub reader_endpoint: Option<String>,
    pub master_username: Option<String>,
    pub db_cluster_parameter_group: Option<String>,
    pub preferred_backup_window: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub iam_database_authentication_enabled: Option<bool>,
    pub scaling_configuration_info: Option<ScalingConfigurationInfo>,
    pub domain_memberships: Vec<DomainMembership>,
}
