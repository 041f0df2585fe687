//! Conversions between [`DbCluster`] and the cluster API shapes.
//!
//! Modify requests are built from the difference between the previous and desired models:
//! the service rejects some unchanged values (an engine version equal to the current one, for
//! example), so only what changed is sent.

use crate::api::{
    self, CreateDbClusterRequest, DbClusterInfo, DeleteDbClusterRequest, ModifyDbClusterRequest,
    ScalingConfigurationInfo,
};
use crate::model::{DbCluster, Endpoint, ScalingConfiguration, Tag};

pub fn create_request(model: &DbCluster, tags: Vec<Tag>) -> CreateDbClusterRequest {
    CreateDbClusterRequest {
        db_cluster_identifier: model.identifier().to_string(),
        engine: model.engine.clone(),
        engine_version: model.engine_version.clone(),
        port: model.port,
        master_username: model.master_username.clone(),
        master_user_password: model.master_user_password.clone(),
        db_cluster_parameter_group_name: model.db_cluster_parameter_group_name.clone(),
        preferred_backup_window: model.preferred_backup_window.clone(),
        preferred_maintenance_window: model.preferred_maintenance_window.clone(),
        enable_iam_database_authentication: model.enable_iam_database_authentication,
        scaling_configuration: to_api_scaling(model.scaling_configuration.as_ref()),
        domain: model.domain.clone(),
        domain_iam_role_name: model.domain_iam_role_name.clone(),
        tags,
    }
}

pub fn modify_request(previous: &DbCluster, desired: &DbCluster, rollback: bool) -> ModifyDbClusterRequest {
    let engine_version = changed(&previous.engine_version, &desired.engine_version);
    let upgrading = engine_version.is_some();
    ModifyDbClusterRequest {
        db_cluster_identifier: desired.identifier().to_string(),
        allow_major_version_upgrade: is_major_upgrade(previous, desired).then_some(true),
        engine_version,
        db_cluster_parameter_group_name: changed(
            &previous.db_cluster_parameter_group_name,
            &desired.db_cluster_parameter_group_name,
        ),
        db_instance_parameter_group_name: if upgrading && !rollback {
            desired.db_instance_parameter_group_name.clone()
        } else {
            None
        },
        preferred_backup_window: changed(&previous.preferred_backup_window, &desired.preferred_backup_window),
        preferred_maintenance_window: changed(
            &previous.preferred_maintenance_window,
            &desired.preferred_maintenance_window,
        ),
        enable_iam_database_authentication: changed(
            &previous.enable_iam_database_authentication,
            &desired.enable_iam_database_authentication,
        ),
        scaling_configuration: changed(&previous.scaling_configuration, &desired.scaling_configuration)
            .as_ref()
            .and_then(|scaling| to_api_scaling(Some(scaling))),
        master_user_password: changed(&previous.master_user_password, &desired.master_user_password),
        port: changed(&previous.port, &desired.port),
        domain: changed(&previous.domain, &desired.domain),
        domain_iam_role_name: changed(&previous.domain_iam_role_name, &desired.domain_iam_role_name),
        apply_immediately: true,
    }
}

/// Clusters are deleted without a final snapshot.
pub fn delete_request(model: &DbCluster) -> DeleteDbClusterRequest {
    DeleteDbClusterRequest {
        db_cluster_identifier: model.identifier().to_string(),
        skip_final_snapshot: true,
        final_db_snapshot_identifier: None,
    }
}

fn changed<T: Clone + PartialEq>(previous: &Option<T>, desired: &Option<T>) -> Option<T> {
    if previous == desired {
        None
    } else {
        desired.clone()
    }
}

fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

fn is_major_upgrade(previous: &DbCluster, desired: &DbCluster) -> bool {
    match (&previous.engine_version, &desired.engine_version) {
        (Some(from), Some(to)) => major_version(from) != major_version(to),
        _ => false,
    }
}

pub fn to_api_scaling(scaling: Option<&ScalingConfiguration>) -> Option<api::ScalingConfiguration> {
    scaling.map(|s| api::ScalingConfiguration {
        auto_pause: s.auto_pause,
        min_capacity: s.min_capacity,
        max_capacity: s.max_capacity,
        seconds_until_auto_pause: s.seconds_until_auto_pause,
        seconds_before_timeout: s.seconds_before_timeout,
        timeout_action: s.timeout_action.clone(),
    })
}

pub fn from_api_scaling(scaling: Option<ScalingConfigurationInfo>) -> Option<ScalingConfiguration> {
    scaling.map(|s| ScalingConfiguration {
        auto_pause: s.auto_pause,
        min_capacity: s.min_capacity,
        max_capacity: s.max_capacity,
        seconds_until_auto_pause: s.seconds_until_auto_pause,
        seconds_before_timeout: s.seconds_before_timeout,
        timeout_action: s.timeout_action,
    })
}

/// The model as described by the service. Write-only properties stay empty.
pub fn model_from(info: DbClusterInfo, tags: Vec<Tag>) -> DbCluster {
    let membership = info.domain_memberships.into_iter().next();
    let (domain, domain_iam_role_name) = membership
        .map(|m| (m.domain, m.iam_role_name))
        .unwrap_or_default();

    DbCluster {
        db_cluster_identifier: Some(info.db_cluster_identifier),
        engine: info.engine,
        engine_version: info.engine_version,
        port: info.port,
        master_username: info.master_username,
        master_user_password: None,
        db_cluster_parameter_group_name: info.db_cluster_parameter_group,
        db_instance_parameter_group_name: None,
        preferred_backup_window: info.preferred_backup_window,
        preferred_maintenance_window: info.preferred_maintenance_window,
        enable_iam_database_authentication: info.iam_database_authentication_enabled,
        scaling_configuration: from_api_scaling(info.scaling_configuration_info),
        domain,
        domain_iam_role_name,
        endpoint: info.endpoint.map(|address| Endpoint {
            address,
            port: info.port,
        }),
        db_cluster_arn: Some(info.db_cluster_arn),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DomainMembership;

    fn cluster() -> DbCluster {
        DbCluster {
            engine_version: Some("13.7".to_string()),
            preferred_backup_window: Some("03:00-04:00".to_string()),
            preferred_maintenance_window: Some("sun:05:00-sun:06:00".to_string()),
            enable_iam_database_authentication: Some(false),
            db_instance_parameter_group_name: Some("instance-pg".to_string()),
            ..DbCluster::new("aurora-postgresql").with_identifier("db-1")
        }
    }

    #[test]
    fn test_unchanged_windows_and_iam_auth_are_omitted() {
        let previous = cluster();
        let request = modify_request(&previous, &previous.clone(), false);

        assert_eq!(request.preferred_backup_window, None);
        assert_eq!(request.preferred_maintenance_window, None);
        assert_eq!(request.enable_iam_database_authentication, None);
        assert!(!request.has_changes());
    }

    #[test]
    fn test_changed_fields_are_sent() {
        let previous = cluster();
        let desired = DbCluster {
            preferred_backup_window: Some("01:00-02:00".to_string()),
            enable_iam_database_authentication: Some(true),
            db_cluster_parameter_group_name: Some("tuned".to_string()),
            ..cluster()
        };
        let request = modify_request(&previous, &desired, false);

        assert_eq!(request.preferred_backup_window.as_deref(), Some("01:00-02:00"));
        assert_eq!(request.enable_iam_database_authentication, Some(true));
        assert_eq!(request.db_cluster_parameter_group_name.as_deref(), Some("tuned"));
        assert_eq!(request.engine_version, None);
        assert_eq!(request.db_instance_parameter_group_name, None);
        assert!(request.apply_immediately);
    }

    #[test]
    fn test_instance_parameter_group_only_with_upgrade() {
        let previous = cluster();
        let desired = DbCluster {
            engine_version: Some("14.3".to_string()),
            ..cluster()
        };

        let upgrade = modify_request(&previous, &desired, false);
        assert_eq!(upgrade.engine_version.as_deref(), Some("14.3"));
        assert_eq!(upgrade.allow_major_version_upgrade, Some(true));
        assert_eq!(upgrade.db_instance_parameter_group_name.as_deref(), Some("instance-pg"));

        let rollback = modify_request(&previous, &desired, true);
        assert_eq!(rollback.engine_version.as_deref(), Some("14.3"));
        assert_eq!(rollback.db_instance_parameter_group_name, None);
    }

    #[test]
    fn test_minor_upgrade_does_not_allow_major() {
        let desired = DbCluster {
            engine_version: Some("13.9".to_string()),
            ..cluster()
        };
        assert_eq!(modify_request(&cluster(), &desired, false).allow_major_version_upgrade, None);
    }

    #[test]
    fn test_scaling_configuration_both_ways() {
        let scaling = ScalingConfiguration {
            auto_pause: Some(true),
            min_capacity: Some(2),
            max_capacity: Some(16),
            seconds_until_auto_pause: Some(300),
            seconds_before_timeout: None,
            timeout_action: Some("RollbackCapacityChange".to_string()),
        };
        let api = to_api_scaling(Some(&scaling));
        let info = api.map(|s| ScalingConfigurationInfo {
            auto_pause: s.auto_pause,
            min_capacity: s.min_capacity,
            max_capacity: s.max_capacity,
            seconds_until_auto_pause: s.seconds_until_auto_pause,
            seconds_before_timeout: s.seconds_before_timeout,
            timeout_action: s.timeout_action,
        });

        assert_eq!(from_api_scaling(info), Some(scaling));
        assert_eq!(to_api_scaling(None), None);
        assert_eq!(from_api_scaling(None), None);
    }

    #[test]
    fn test_domain_comes_from_first_membership() {
        let info = DbClusterInfo {
            db_cluster_identifier: "db-1".to_string(),
            engine: "aurora-postgresql".to_string(),
            domain_memberships: vec![
                DomainMembership {
                    domain: Some("d-111".to_string()),
                    iam_role_name: Some("role-1".to_string()),
                    status: Some("joined".to_string()),
                },
                DomainMembership {
                    domain: Some("d-222".to_string()),
                    iam_role_name: None,
                    status: None,
                },
            ],
            ..Default::default()
        };
        let model = model_from(info.clone(), vec![]);
        assert_eq!(model.domain.as_deref(), Some("d-111"));
        assert_eq!(model.domain_iam_role_name.as_deref(), Some("role-1"));

        let without = model_from(
            DbClusterInfo {
                domain_memberships: vec![],
                ..info
            },
            vec![],
        );
        assert_eq!(without.domain, None);
        assert_eq!(without.domain_iam_role_name, None);
    }

    #[test]
    fn test_model_round_trip_keeps_caller_fields() {
        let model = DbCluster {
            port: Some(5432),
            master_username: Some("admin".to_string()),
            master_user_password: Some("secret".to_string()),
            db_cluster_parameter_group_name: Some("tuned".to_string()),
            scaling_configuration: Some(ScalingConfiguration {
                auto_pause: Some(true),
                min_capacity: Some(2),
                max_capacity: Some(8),
                ..Default::default()
            }),
            domain: Some("d-111".to_string()),
            domain_iam_role_name: Some("role-1".to_string()),
            tags: vec![Tag::new("team", "data")],
            ..cluster()
        };
        let request = create_request(&model, model.tags.clone());
        let info = DbClusterInfo {
            db_cluster_identifier: request.db_cluster_identifier,
            db_cluster_arn: "arn:cluster:db-1".to_string(),
            engine: request.engine,
            engine_version: request.engine_version,
            status: "available".to_string(),
            port: request.port,
            endpoint: Some("db-1.cluster.local".to_string()),
            reader_endpoint: None,
            master_username: request.master_username,
            db_cluster_parameter_group: request.db_cluster_parameter_group_name,
            preferred_backup_window: request.preferred_backup_window,
            preferred_maintenance_window: request.preferred_maintenance_window,
            iam_database_authentication_enabled: request.enable_iam_database_authentication,
            scaling_configuration_info: request.scaling_configuration.map(|s| ScalingConfigurationInfo {
                auto_pause: s.auto_pause,
                min_capacity: s.min_capacity,
                max_capacity: s.max_capacity,
                seconds_until_auto_pause: s.seconds_until_auto_pause,
                seconds_before_timeout: s.seconds_before_timeout,
                timeout_action: s.timeout_action,
            }),
            domain_memberships: vec![DomainMembership {
                domain: request.domain,
                iam_role_name: request.domain_iam_role_name,
                status: Some("joined".to_string()),
            }],
        };

        let read = model_from(info, request.tags);
        assert_eq!(read.db_cluster_arn.as_deref(), Some("arn:cluster:db-1"));
        assert_eq!(
            read.endpoint,
            Some(Endpoint {
                address: "db-1.cluster.local".to_string(),
                port: Some(5432),
            })
        );
        // Write-only and service-assigned fields do not come back.
        assert_eq!(
            DbCluster {
                master_user_password: Some("secret".to_string()),
                db_instance_parameter_group_name: Some("instance-pg".to_string()),
                endpoint: None,
                db_cluster_arn: None,
                ..read
            },
            model
        );
    }

    #[test]
    fn test_delete_skips_final_snapshot() {
        let request = delete_request(&cluster());
        assert!(request.skip_final_snapshot);
        assert_eq!(request.final_db_snapshot_identifier, None);
    }
}
