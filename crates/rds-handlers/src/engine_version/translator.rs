//! Conversions between [`CustomDbEngineVersion`] and the engine version API shapes.

use crate::api::{CreateCustomDbEngineVersionRequest, DbEngineVersionInfo, ModifyCustomDbEngineVersionRequest};
use crate::model::{CustomDbEngineVersion, Tag};

pub fn create_request(model: &CustomDbEngineVersion, tags: Vec<Tag>) -> CreateCustomDbEngineVersionRequest {
    CreateCustomDbEngineVersionRequest {
        engine: model.engine.clone(),
        engine_version: model.engine_version.clone(),
        database_installation_files_s3_bucket_name: model.database_installation_files_s3_bucket_name.clone(),
        database_installation_files_s3_prefix: model.database_installation_files_s3_prefix.clone(),
        description: model.description.clone(),
        kms_key_id: model.kms_key_id.clone(),
        manifest: model.manifest.clone(),
        tags,
    }
}

/// Only description and status can change in place; unchanged values are left out.
pub fn modify_request(
    previous: &CustomDbEngineVersion,
    desired: &CustomDbEngineVersion,
) -> ModifyCustomDbEngineVersionRequest {
    ModifyCustomDbEngineVersionRequest {
        engine: desired.engine.clone(),
        engine_version: desired.engine_version.clone(),
        description: changed(&previous.description, &desired.description),
        status: changed(&previous.status, &desired.status),
    }
}

fn changed(previous: &Option<String>, desired: &Option<String>) -> Option<String> {
    if previous == desired {
        None
    } else {
        desired.clone()
    }
}

pub fn model_from(info: DbEngineVersionInfo, tags: Vec<Tag>) -> CustomDbEngineVersion {
    CustomDbEngineVersion {
        engine: info.engine,
        engine_version: info.engine_version,
        database_installation_files_s3_bucket_name: info.database_installation_files_s3_bucket_name,
        database_installation_files_s3_prefix: info.database_installation_files_s3_prefix,
        description: info.db_engine_version_description,
        kms_key_id: info.kms_key_id,
        manifest: info.custom_db_engine_version_manifest,
        status: Some(info.status),
        db_engine_version_arn: Some(info.db_engine_version_arn),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modify_request_carries_only_changes() {
        let previous = CustomDbEngineVersion {
            description: Some("v1".to_string()),
            status: Some("available".to_string()),
            ..CustomDbEngineVersion::new("custom-oracle-ee", "19.cev1")
        };

        let unchanged = modify_request(&previous, &previous.clone());
        assert!(!unchanged.has_changes());

        let desired = CustomDbEngineVersion {
            status: Some("inactive".to_string()),
            ..previous.clone()
        };
        let request = modify_request(&previous, &desired);
        assert_eq!(request.status.as_deref(), Some("inactive"));
        assert_eq!(request.description, None);
    }

    #[test]
    fn test_model_round_trip_keeps_caller_fields() {
        let model = CustomDbEngineVersion {
            database_installation_files_s3_bucket_name: Some("media".to_string()),
            database_installation_files_s3_prefix: Some("oracle/19".to_string()),
            kms_key_id: Some("key-1".to_string()),
            manifest: Some("{}".to_string()),
            description: Some("first".to_string()),
            tags: vec![Tag::new("env", "dev")],
            ..CustomDbEngineVersion::new("custom-oracle-ee", "19.cev1")
        };
        let request = create_request(&model, model.tags.clone());
        let info = DbEngineVersionInfo {
            engine: request.engine,
            engine_version: request.engine_version,
            database_installation_files_s3_bucket_name: request.database_installation_files_s3_bucket_name,
            database_installation_files_s3_prefix: request.database_installation_files_s3_prefix,
            db_engine_version_description: request.description,
            kms_key_id: request.kms_key_id,
            custom_db_engine_version_manifest: request.manifest,
            status: "available".to_string(),
            db_engine_version_arn: "arn:cev".to_string(),
        };

        let read = model_from(info, request.tags);
        // Status and ARN are assigned by the service.
        assert_eq!(
            CustomDbEngineVersion {
                status: None,
                db_engine_version_arn: None,
                ..read
            },
            model
        );
    }
}
