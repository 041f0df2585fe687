use rds_handlers::clients::InMemoryRds;
use rds_handlers::lifecycle::RdsSystem;
use rds_handlers::model::{CustomDbEngineVersion, DbCluster, DbClusterParameterGroup, Tag};
use rds_reconciler::{drive, Completed};
use reconcile_framework::tracing::setup_tracing;
use reconcile_framework::{HandlerClient, HandlerRequest, OperationType, Outcome};
use std::sync::Arc;
use tracing::{error, info, Instrument};

const MAX_INVOCATIONS: usize = 100;

/// Drives one operation and treats anything but success as an error.
async fn run<M: Clone>(
    client: &HandlerClient<M>,
    operation: OperationType,
    request: HandlerRequest<M>,
) -> Result<Completed<M>, String> {
    let completed = drive(client, operation, request, MAX_INVOCATIONS)
        .await
        .map_err(|e| e.to_string())?;
    match completed.event.outcome() {
        Outcome::Success => Ok(completed),
        outcome => Err(format!("{operation} ended with {outcome:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting RDS reconciler demo");

    // Every mutation takes a few status checks to settle.
    let rds = Arc::new(InMemoryRds::builder().settle_after(2).build());
    let system = RdsSystem::new(rds.clone());

    let group = DbClusterParameterGroup::new("aurora-postgresql14", "Tuned for reporting")
        .with_name("reporting-params")
        .with_parameter("work_mem", "65536")
        .with_parameter("log_min_duration_statement", "500")
        .with_tag("team", "analytics");

    let span = tracing::info_span!("parameter_group");
    let group = async {
        let request = HandlerRequest::new(group, "demo-pg-create");
        let created = run(&system.parameter_group_client, OperationType::Create, request).await?;
        info!(invocations = created.invocations, "Parameter group created");
        Ok::<_, String>(created.event.resource_model)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("engine_version");
    async {
        let cev = CustomDbEngineVersion {
            database_installation_files_s3_bucket_name: Some("oracle-media".to_string()),
            description: Some("Oracle 19c with the April patch set".to_string()),
            ..CustomDbEngineVersion::new("custom-oracle-ee", "19.my_cev1")
        };
        let request = HandlerRequest::new(cev, "demo-cev-create");
        let created = run(&system.engine_version_client, OperationType::Create, request).await?;
        info!(
            invocations = created.invocations,
            arn = ?created.event.resource_model.db_engine_version_arn,
            "Custom engine version created"
        );
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("cluster");
    let result = async {
        let cluster = DbCluster {
            master_username: Some("admin".to_string()),
            master_user_password: Some("correct-horse-battery".to_string()),
            db_cluster_parameter_group_name: group.db_cluster_parameter_group_name.clone(),
            tags: vec![Tag::new("team", "analytics")],
            ..DbCluster::new("aurora-postgresql")
        };
        let request = HandlerRequest::new(cluster, "demo-cluster-create").with_logical_identifier("ReportingDb");
        let created = run(&system.cluster_client, OperationType::Create, request).await?;
        let previous = created.event.resource_model;
        info!(
            identifier = previous.identifier(),
            invocations = created.invocations,
            "Cluster created"
        );

        let desired = DbCluster {
            preferred_backup_window: Some("02:00-03:00".to_string()),
            tags: vec![Tag::new("team", "analytics"), Tag::new("env", "prod")],
            ..previous.clone()
        };
        let request = HandlerRequest::new(desired, "demo-cluster-update").with_previous(previous);
        let updated = run(&system.cluster_client, OperationType::Update, request).await?;
        info!(invocations = updated.invocations, "Cluster updated");
        match serde_json::to_string_pretty(&updated.event.resource_model) {
            Ok(json) => info!("Cluster model:\n{json}"),
            Err(e) => error!(error = %e, "Could not serialize cluster model"),
        }

        let request = HandlerRequest::new(updated.event.resource_model, "demo-cluster-delete");
        let deleted = run(&system.cluster_client, OperationType::Delete, request).await?;
        info!(invocations = deleted.invocations, "Cluster deleted");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = result {
        error!(error = %e, "Cluster lifecycle failed");
    }

    system.shutdown().await?;

    info!(calls = rds.recorder().calls().len(), "Demo completed");
    Ok(())
}
