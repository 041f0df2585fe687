use super::Tag;
use serde::{Deserialize, Serialize};

/// `AWS::RDS::CustomDBEngineVersion`. Identified by `(Engine, EngineVersion)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomDbEngineVersion {
    pub engine: String,
    pub engine_version: String,
    #[serde(rename = "DatabaseInstallationFilesS3BucketName", default, skip_serializing_if = "Option::is_none")]
    pub database_installation_files_s3_bucket_name: Option<String>,
    #[serde(rename = "DatabaseInstallationFilesS3Prefix", default, skip_serializing_if = "Option::is_none")]
    pub database_installation_files_s3_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "KMSKeyId", default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    /// `available`, `inactive` or `inactive-except-restore`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Read-only; assigned by the service.
    #[serde(rename = "DBEngineVersionArn", default, skip_serializing_if = "Option::is_none")]
    pub db_engine_version_arn: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl CustomDbEngineVersion {
    pub fn new(engine: impl Into<String>, engine_version: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            engine_version: engine_version.into(),
            ..Default::default()
        }
    }

    pub fn identifier(&self) -> String {
        format!("{}:{}", self.engine, self.engine_version)
    }
}
