use super::Tag;
use serde::{Deserialize, Serialize};

/// Serverless scaling settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalingConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pause: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_capacity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_until_auto_pause: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_before_timeout: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    pub address: String,
    pub port: Option<u16>,
}

/// `AWS::RDS::DBCluster`, the subset of properties this crate manages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbCluster {
    /// Generated from the logical identifier when not supplied.
    #[serde(rename = "DBClusterIdentifier", default, skip_serializing_if = "Option::is_none")]
    pub db_cluster_identifier: Option<String>,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_username: Option<String>,
    /// Write-only; never read back from the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_user_password: Option<String>,
    #[serde(rename = "DBClusterParameterGroupName", default, skip_serializing_if = "Option::is_none")]
    pub db_cluster_parameter_group_name: Option<String>,
    /// Write-only; only sent along with an engine version upgrade.
    #[serde(rename = "DBInstanceParameterGroupName", default, skip_serializing_if = "Option::is_none")]
    pub db_instance_parameter_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_backup_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_maintenance_window: Option<String>,
    #[serde(rename = "EnableIAMDatabaseAuthentication", default, skip_serializing_if = "Option::is_none")]
    pub enable_iam_database_authentication: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_configuration: Option<ScalingConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "DomainIAMRoleName", default, skip_serializing_if = "Option::is_none")]
    pub domain_iam_role_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    #[serde(rename = "DBClusterArn", default, skip_serializing_if = "Option::is_none")]
    pub db_cluster_arn: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DbCluster {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            ..Default::default()
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.db_cluster_identifier = Some(identifier.into());
        self
    }

    pub fn identifier(&self) -> &str {
        self.db_cluster_identifier.as_deref().unwrap_or_default()
    }
}
