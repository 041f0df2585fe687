use rds_handlers::clients::{calls, InMemoryRds};
use rds_handlers::cluster::ClusterHandler;
use rds_handlers::engine_version::EngineVersionHandler;
use rds_handlers::lifecycle::RdsSystem;
use rds_handlers::model::{tags_to_map, CustomDbEngineVersion, DbCluster, DbClusterParameterGroup, Tag};
use rds_handlers::parameter_group::ParameterGroupHandler;
use reconcile_framework::{
    Backoff, HandlerConfig, HandlerErrorCode, HandlerRequest, OperationType, Orchestrator, Outcome, ProviderError,
};
use std::sync::Arc;
use std::time::Duration;

fn parameter_group(parameters: usize) -> DbClusterParameterGroup {
    (0..parameters).fold(
        DbClusterParameterGroup::new("aurora-postgresql14", "tuned").with_name("tuned-pg"),
        |group, i| group.with_parameter(format!("param_{i:02}"), i.to_string()),
    )
}

fn cluster() -> DbCluster {
    DbCluster {
        master_username: Some("admin".to_string()),
        master_user_password: Some("hunter22".to_string()),
        tags: vec![Tag::new("team", "data")],
        ..DbCluster::new("aurora-postgresql").with_identifier("db-1")
    }
}

/// Creates a cluster that settles immediately and returns the read-back model.
async fn created_cluster(rds: &InMemoryRds, orchestrator: &Orchestrator<ClusterHandler>) -> DbCluster {
    let request = HandlerRequest::new(cluster(), "create-token");
    let mut event = orchestrator.handle(rds, OperationType::Create, &request, None).await;
    while event.is_in_progress() {
        event = orchestrator
            .handle(rds, OperationType::Create, &request, Some(event.callback_context))
            .await;
    }
    assert!(event.is_success(), "{:?}", event.outcome());
    rds.recorder().clear_calls();
    event.resource_model
}

#[tokio::test]
async fn test_parameter_group_create_applies_parameters_in_batches() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ParameterGroupHandler::default());
    let model = parameter_group(25).with_tag("team", "data");

    let event = orchestrator
        .handle(&rds, OperationType::Create, &HandlerRequest::new(model.clone(), "token-1"), None)
        .await;

    assert_eq!(event.outcome(), Outcome::Success);
    assert_eq!(event.resource_model, model);
    assert_eq!(rds.recorder().count(calls::CREATE_DB_CLUSTER_PARAMETER_GROUP), 1);
    assert_eq!(rds.recorder().count(calls::MODIFY_DB_CLUSTER_PARAMETER_GROUP), 2);
}

#[tokio::test]
async fn test_parameter_group_tag_only_update_makes_only_tag_calls() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ParameterGroupHandler::default());
    let created = orchestrator
        .handle(&rds, OperationType::Create, &HandlerRequest::new(parameter_group(3), "token-1"), None)
        .await
        .resource_model;
    rds.recorder().clear_calls();

    let desired = created.clone().with_tag("env", "prod");
    let request = HandlerRequest::new(desired.clone(), "token-2").with_previous(created);
    let event = orchestrator.handle(&rds, OperationType::Update, &request, None).await;

    assert_eq!(event.outcome(), Outcome::Success);
    assert_eq!(tags_to_map(&event.resource_model.tags), tags_to_map(&desired.tags));
    let recorder = rds.recorder();
    assert_eq!(recorder.count(calls::ADD_TAGS_TO_RESOURCE), 1);
    assert_eq!(recorder.count(calls::REMOVE_TAGS_FROM_RESOURCE), 0);
    for mutation in [
        calls::CREATE_DB_CLUSTER_PARAMETER_GROUP,
        calls::MODIFY_DB_CLUSTER_PARAMETER_GROUP,
        calls::RESET_DB_CLUSTER_PARAMETER_GROUP,
    ] {
        assert_eq!(recorder.count(mutation), 0, "{mutation}");
    }
}

#[tokio::test]
async fn test_parameter_reset_reruns_until_apply_completes() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ParameterGroupHandler::default());
    let created = orchestrator
        .handle(
            &rds,
            OperationType::Create,
            &HandlerRequest::new(parameter_group(0).with_parameter("work_mem", "1024"), "token-1"),
            None,
        )
        .await
        .resource_model;
    rds.recorder().clear_calls();

    let desired = created.clone().with_parameter("work_mem", "4096");
    let request = HandlerRequest::new(desired, "token-2").with_previous(created);
    rds.recorder()
        .expect(calls::MODIFY_DB_CLUSTER_PARAMETER_GROUP)
        .return_err(ProviderError::new("ThrottlingException", "Rate exceeded"));

    let first = orchestrator.handle(&rds, OperationType::Update, &request, None).await;
    assert_eq!(
        first.outcome(),
        Outcome::Retryable {
            code: HandlerErrorCode::Throttling,
            delay: Duration::from_secs(5),
        }
    );
    assert_eq!(rds.recorder().count(calls::RESET_DB_CLUSTER_PARAMETER_GROUP), 1);

    let second = orchestrator
        .handle(&rds, OperationType::Update, &request, Some(first.callback_context))
        .await;
    assert_eq!(second.outcome(), Outcome::Success);
    assert_eq!(rds.recorder().count(calls::RESET_DB_CLUSTER_PARAMETER_GROUP), 2);
    assert_eq!(
        rds.parameters_of("tuned-pg").and_then(|p| p.get("work_mem").cloned()).as_deref(),
        Some("4096")
    );
    rds.recorder().verify();
}

#[tokio::test]
async fn test_cluster_create_calls_provider_once_across_invocations() {
    let rds = InMemoryRds::builder().settle_after(2).build();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let request = HandlerRequest::new(cluster(), "token-1");

    let first = orchestrator.handle(&rds, OperationType::Create, &request, None).await;
    assert_eq!(first.outcome(), Outcome::InProgress { delay: Duration::from_secs(30) });

    let second = orchestrator
        .handle(&rds, OperationType::Create, &request, Some(first.callback_context))
        .await;
    assert!(second.is_in_progress_callback_delay());

    let third = orchestrator
        .handle(&rds, OperationType::Create, &request, Some(second.callback_context))
        .await;
    assert_eq!(third.outcome(), Outcome::Success);
    assert_eq!(rds.recorder().count(calls::CREATE_DB_CLUSTER), 1);

    let model = third.resource_model;
    assert_eq!(model.port, Some(5432));
    assert!(model.db_cluster_arn.is_some());
    assert!(model.endpoint.is_some());
    assert_eq!(model.master_user_password, None);
}

#[tokio::test]
async fn test_cluster_identifier_is_generated_from_logical_id() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let model = DbCluster::new("aurora-mysql");
    let request = HandlerRequest::new(model, "token-1").with_logical_identifier("AppDatabase");

    let event = orchestrator.handle(&rds, OperationType::Create, &request, None).await;

    assert!(event.is_success());
    let identifier = event.resource_model.identifier().to_string();
    assert!(identifier.starts_with("appdatabase-"), "{identifier}");
    assert!(rds.cluster(&identifier).is_some());
}

#[tokio::test]
async fn test_generated_identifier_is_resumed_from_the_context() {
    let rds = InMemoryRds::builder().settle_after(1).build();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let request = HandlerRequest::new(DbCluster::new("aurora-mysql"), "token-1").with_logical_identifier("AppDatabase");

    let first = orchestrator.handle(&rds, OperationType::Create, &request, None).await;
    assert!(first.is_in_progress_callback_delay());
    let identifier: String = first
        .callback_context
        .carried("identifier")
        .unwrap()
        .expect("generated name is carried");
    assert_eq!(first.resource_model.identifier(), identifier);

    // A resumed invocation that would generate a different name still targets the carried one.
    let resumed = HandlerRequest::new(DbCluster::new("aurora-mysql"), "token-other").with_logical_identifier("AppDatabase");
    let second = orchestrator
        .handle(&rds, OperationType::Create, &resumed, Some(first.callback_context))
        .await;

    assert_eq!(second.outcome(), Outcome::Success);
    assert_eq!(second.resource_model.identifier(), identifier);
    assert_eq!(rds.recorder().count(calls::CREATE_DB_CLUSTER), 1);
}

#[tokio::test]
async fn test_cluster_terminal_status_fails_immediately() {
    let rds = InMemoryRds::new();
    rds.cluster_statuses().push("incompatible-parameters".to_string());
    let orchestrator = Orchestrator::new(ClusterHandler::default());

    let event = orchestrator
        .handle(&rds, OperationType::Create, &HandlerRequest::new(cluster(), "token-1"), None)
        .await;

    match event.outcome() {
        Outcome::Failed { code, message } => {
            assert_eq!(code, HandlerErrorCode::NotStabilized);
            assert!(message.contains("incompatible-parameters"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cluster_stabilization_times_out() {
    let rds = InMemoryRds::builder().settle_after(10).build();
    let config = HandlerConfig::new(Backoff::constant(Duration::from_secs(30), Duration::from_secs(60)));
    let orchestrator = Orchestrator::new(ClusterHandler::new(config));
    let request = HandlerRequest::new(cluster(), "token-1");

    let first = orchestrator.handle(&rds, OperationType::Create, &request, None).await;
    assert!(first.is_in_progress());

    let second = orchestrator
        .handle(&rds, OperationType::Create, &request, Some(first.callback_context))
        .await;
    assert!(matches!(
        second.outcome(),
        Outcome::Failed { code: HandlerErrorCode::NotStabilized, .. }
    ));
}

#[tokio::test]
async fn test_cluster_throttled_status_checks_still_time_out() {
    let rds = InMemoryRds::new();
    rds.recorder()
        .expect(calls::DESCRIBE_DB_CLUSTERS)
        .times(50)
        .return_err(ProviderError::new("ThrottlingException", "Rate exceeded"));
    let config = HandlerConfig::new(Backoff::constant(Duration::from_secs(30), Duration::from_secs(60)));
    let orchestrator = Orchestrator::new(ClusterHandler::new(config));
    let request = HandlerRequest::new(cluster(), "token-1");

    let first = orchestrator.handle(&rds, OperationType::Create, &request, None).await;
    assert_eq!(
        first.outcome(),
        Outcome::Retryable {
            code: HandlerErrorCode::Throttling,
            delay: Duration::from_secs(30)
        }
    );

    let second = orchestrator
        .handle(&rds, OperationType::Create, &request, Some(first.callback_context))
        .await;
    assert!(matches!(
        second.outcome(),
        Outcome::Failed { code: HandlerErrorCode::NotStabilized, .. }
    ));
    assert_eq!(rds.recorder().count(calls::CREATE_DB_CLUSTER), 1);
    assert_eq!(rds.recorder().count(calls::DESCRIBE_DB_CLUSTERS), 2);
}

#[tokio::test]
async fn test_cluster_modify_waits_for_available() {
    let rds = InMemoryRds::builder().settle_after(1).build();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let previous = created_cluster(&rds, &orchestrator).await;

    let desired = DbCluster {
        port: Some(6543),
        ..previous.clone()
    };
    let request = HandlerRequest::new(desired, "token-2").with_previous(previous);

    let first = orchestrator.handle(&rds, OperationType::Update, &request, None).await;
    assert!(first.is_in_progress_callback_delay());

    let second = orchestrator
        .handle(&rds, OperationType::Update, &request, Some(first.callback_context))
        .await;
    assert_eq!(second.outcome(), Outcome::Success);
    assert_eq!(second.resource_model.port, Some(6543));
    assert_eq!(rds.recorder().count(calls::MODIFY_DB_CLUSTER), 1);
}

#[tokio::test]
async fn test_cluster_tagging_conflict_is_a_soft_failure() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let previous = created_cluster(&rds, &orchestrator).await;

    let mut desired = previous.clone();
    desired.tags.push(Tag::new("env", "prod"));
    rds.recorder()
        .expect(calls::ADD_TAGS_TO_RESOURCE)
        .return_err(ProviderError::new("InvalidDBClusterStateFault", "cluster is modifying"));

    let request = HandlerRequest::new(desired, "token-2").with_previous(previous);
    let event = orchestrator.handle(&rds, OperationType::Update, &request, None).await;

    assert_eq!(event.outcome(), Outcome::Success);
    assert_eq!(event.callback_context.soft_failures().len(), 1);
    assert_eq!(rds.recorder().count(calls::MODIFY_DB_CLUSTER), 0);
}

#[tokio::test]
async fn test_cluster_delete_is_stable_once_gone() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(ClusterHandler::default());
    let created = created_cluster(&rds, &orchestrator).await;

    let request = HandlerRequest::new(created, "token-2");
    let event = orchestrator.handle(&rds, OperationType::Delete, &request, None).await;

    assert_eq!(event.outcome(), Outcome::Success);
    assert!(rds.cluster("db-1").is_none());

    let again = orchestrator.handle(&rds, OperationType::Delete, &request, None).await;
    assert!(matches!(
        again.outcome(),
        Outcome::Failed { code: HandlerErrorCode::NotFound, .. }
    ));
}

#[tokio::test]
async fn test_engine_version_lifecycle() {
    let rds = InMemoryRds::builder().settle_after(1).build();
    let orchestrator = Orchestrator::new(EngineVersionHandler::default());
    let model = CustomDbEngineVersion {
        database_installation_files_s3_bucket_name: Some("media".to_string()),
        description: Some("first".to_string()),
        ..CustomDbEngineVersion::new("custom-oracle-ee", "19.cev1")
    };
    let create = HandlerRequest::new(model, "token-1");

    let first = orchestrator.handle(&rds, OperationType::Create, &create, None).await;
    assert!(first.is_in_progress_callback_delay());
    let created = orchestrator
        .handle(&rds, OperationType::Create, &create, Some(first.callback_context))
        .await;
    assert_eq!(created.outcome(), Outcome::Success);
    assert_eq!(created.resource_model.status.as_deref(), Some("available"));

    let desired = CustomDbEngineVersion {
        status: Some("inactive".to_string()),
        ..created.resource_model.clone()
    };
    let update = HandlerRequest::new(desired, "token-2").with_previous(created.resource_model);
    let updated = orchestrator.handle(&rds, OperationType::Update, &update, None).await;
    assert_eq!(updated.outcome(), Outcome::Success);
    assert_eq!(updated.resource_model.status.as_deref(), Some("inactive"));
    assert_eq!(rds.recorder().count(calls::MODIFY_CUSTOM_DB_ENGINE_VERSION), 1);
}

#[tokio::test]
async fn test_engine_version_created_with_an_inactive_status() {
    let rds = InMemoryRds::builder().settle_after(1).build();
    let orchestrator = Orchestrator::new(EngineVersionHandler::default());
    let model = CustomDbEngineVersion {
        database_installation_files_s3_bucket_name: Some("media".to_string()),
        status: Some("inactive".to_string()),
        ..CustomDbEngineVersion::new("custom-oracle-ee", "19.cev2")
    };
    let create = HandlerRequest::new(model, "token-1");

    let first = orchestrator.handle(&rds, OperationType::Create, &create, None).await;
    assert!(first.is_in_progress_callback_delay());
    assert_eq!(rds.recorder().count(calls::MODIFY_CUSTOM_DB_ENGINE_VERSION), 0);

    let created = orchestrator
        .handle(&rds, OperationType::Create, &create, Some(first.callback_context))
        .await;
    assert_eq!(created.outcome(), Outcome::Success);
    assert_eq!(created.resource_model.status.as_deref(), Some("inactive"));
    assert_eq!(rds.recorder().count(calls::CREATE_CUSTOM_DB_ENGINE_VERSION), 1);
    assert_eq!(rds.recorder().count(calls::MODIFY_CUSTOM_DB_ENGINE_VERSION), 1);
}

#[tokio::test]
async fn test_engine_version_created_available_needs_no_modify() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(EngineVersionHandler::default());
    let model = CustomDbEngineVersion {
        status: Some("available".to_string()),
        ..CustomDbEngineVersion::new("custom-oracle-ee", "19.cev3")
    };

    let event = orchestrator
        .handle(&rds, OperationType::Create, &HandlerRequest::new(model, "token-1"), None)
        .await;

    assert_eq!(event.outcome(), Outcome::Success);
    assert_eq!(rds.recorder().count(calls::MODIFY_CUSTOM_DB_ENGINE_VERSION), 0);
}

#[tokio::test]
async fn test_engine_version_read_of_missing_version_is_not_found() {
    let rds = InMemoryRds::new();
    let orchestrator = Orchestrator::new(EngineVersionHandler::default());
    let request = HandlerRequest::new(CustomDbEngineVersion::new("custom-oracle-ee", "19.missing"), "token-1");

    let event = orchestrator.handle(&rds, OperationType::Read, &request, None).await;

    assert!(matches!(
        event.outcome(),
        Outcome::Failed { code: HandlerErrorCode::NotFound, .. }
    ));
}

#[tokio::test]
async fn test_system_serves_every_resource_type() {
    let rds = Arc::new(InMemoryRds::new());
    let system = RdsSystem::new(rds.clone());

    let group = system
        .parameter_group_client
        .handle(OperationType::Create, HandlerRequest::new(parameter_group(1), "token-1"), None)
        .await
        .unwrap();
    assert!(group.is_success());

    let mut model = cluster();
    model.db_cluster_parameter_group_name = Some("tuned-pg".to_string());
    let created = system
        .cluster_client
        .handle(OperationType::Create, HandlerRequest::new(model, "token-2"), None)
        .await
        .unwrap();
    assert!(created.is_success());
    assert_eq!(
        rds.cluster("db-1").and_then(|c| c.db_cluster_parameter_group).as_deref(),
        Some("tuned-pg")
    );

    system.shutdown().await.unwrap();
}
