//! [`ResourceHandler`] implementation for [`DbCluster`].

use super::{translator, ClusterStatus, CLUSTER_RULES};
use crate::api::{CreateDbClusterRequest, DbClusterInfo, DeleteDbClusterRequest, ModifyDbClusterRequest};
use crate::clients::RdsClient;
use crate::common::{creation_tags, physical_name, tag_sets, update_tags_once, CREATE_STEP, DELETE_STEP, MODIFY_STEP};
use crate::model::{DbCluster, Endpoint, Tag};
use async_trait::async_trait;
use reconcile_framework::{
    exec_once, HandlerConfig, HandlerErrorCode, HandlerRequest, Mutation, PollTarget, ProgressEvent, ProviderError, ResourceHandler,
    StabilizationPoller, StepError, StepExecutor,
};
use tracing::{debug, instrument};

/// Cluster identifiers may be up to 63 characters.
const MAX_IDENTIFIER_LEN: usize = 63;

pub struct ClusterHandler {
    config: HandlerConfig,
}

impl ClusterHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self { config }
    }

    fn executor(&self) -> StepExecutor<'static> {
        StepExecutor::new(&self.config, &CLUSTER_RULES)
    }

    async fn read_current(&self, client: &dyn RdsClient, progress: ProgressEvent<DbCluster>) -> ProgressEvent<DbCluster> {
        let identifier = progress.resource_model.identifier().to_string();
        let current = async {
            let info = client.describe_db_clusters(&identifier).await?;
            let tags = client.list_tags_for_resource(&info.db_cluster_arn).await?;
            Ok::<_, ProviderError>(translator::model_from(info, tags))
        }
        .await;

        match current {
            Ok(model) => ProgressEvent::success(model, progress.callback_context),
            Err(e) => self.executor().handle(progress, &StepError::Provider(e)),
        }
    }
}

impl Default for ClusterHandler {
    fn default() -> Self {
        Self::new(super::config())
    }
}

async fn poll(client: &dyn RdsClient, model: &DbCluster, target: PollTarget) -> Result<bool, StepError> {
    let identifier = model.identifier();
    let fetch = async { client.describe_db_clusters(identifier).await.map(|info| Some(info.status)) };
    StabilizationPoller::new(&CLUSTER_RULES, target)
        .poll::<ClusterStatus, _>(identifier, fetch)
        .await
}

#[async_trait]
impl ResourceHandler for ClusterHandler {
    type Model = DbCluster;
    type Client = dyn RdsClient;

    const TYPE_NAME: &'static str = "AWS::RDS::DBCluster";

    async fn create(
        &self,
        request: &HandlerRequest<DbCluster>,
        mut progress: ProgressEvent<DbCluster>,
        client: &Self::Client,
    ) -> ProgressEvent<DbCluster> {
        if progress.resource_model.db_cluster_identifier.is_none() {
            match physical_name(request, &mut progress.callback_context, MAX_IDENTIFIER_LEN) {
                Ok(name) => progress.resource_model.db_cluster_identifier = Some(name),
                Err(e) => {
                    let ProgressEvent {
                        resource_model,
                        callback_context,
                        ..
                    } = progress;
                    return ProgressEvent::failed(
                        resource_model,
                        callback_context,
                        HandlerErrorCode::InternalError,
                        e.to_string(),
                    );
                }
            }
        }

        let executor = &self.executor();
        let create = &CreateCluster {
            tags: creation_tags(request, &request.desired_resource_state.tags),
        };

        progress
            .then(move |p| exec_once(CREATE_STEP, p, move |p| executor.execute(create, client, p)))
            .await
            .then(move |p| self.read_current(client, p))
            .await
    }

    async fn read(
        &self,
        _request: &HandlerRequest<DbCluster>,
        progress: ProgressEvent<DbCluster>,
        client: &Self::Client,
    ) -> ProgressEvent<DbCluster> {
        self.read_current(client, progress).await
    }

    #[instrument(skip_all, fields(rollback = request.rollback))]
    async fn update(
        &self,
        request: &HandlerRequest<DbCluster>,
        mut progress: ProgressEvent<DbCluster>,
        client: &Self::Client,
    ) -> ProgressEvent<DbCluster> {
        let desired = &request.desired_resource_state;
        let previous = request.previous_resource_state.as_ref().unwrap_or(desired);
        if progress.resource_model.db_cluster_identifier.is_none() {
            progress.resource_model.db_cluster_identifier = previous.db_cluster_identifier.clone();
        }

        let modify = &ModifyCluster {
            previous,
            rollback: request.rollback,
        };
        let has_changes = modify.translate(&progress.resource_model).has_changes();
        debug!(has_changes, "Planned cluster modification");

        let executor = &self.executor();
        let identifier = progress.resource_model.identifier().to_string();
        let arn = async {
            client
                .describe_db_clusters(&identifier)
                .await
                .map(|info| info.db_cluster_arn)
        };

        update_tags_once(
            client,
            &CLUSTER_RULES,
            executor.delay(),
            progress,
            arn,
            tag_sets(request, &previous.tags, &desired.tags),
        )
        .await
        .then(move |p| async move {
            if has_changes {
                exec_once(MODIFY_STEP, p, move |p| executor.execute(modify, client, p)).await
            } else {
                p
            }
        })
        .await
        .then(move |p| self.read_current(client, p))
        .await
    }

    async fn delete(
        &self,
        _request: &HandlerRequest<DbCluster>,
        progress: ProgressEvent<DbCluster>,
        client: &Self::Client,
    ) -> ProgressEvent<DbCluster> {
        self.executor()
            .execute(&DeleteCluster, client, progress)
            .await
            .then(|p| async move { ProgressEvent::success(p.resource_model, p.callback_context) })
            .await
    }
}

struct CreateCluster {
    tags: Vec<Tag>,
}

#[async_trait]
impl Mutation for CreateCluster {
    type Model = DbCluster;
    type Client = dyn RdsClient;
    type Request = CreateDbClusterRequest;
    type Response = DbClusterInfo;

    fn name(&self) -> &str {
        CREATE_STEP
    }

    fn translate(&self, model: &DbCluster) -> Self::Request {
        translator::create_request(model, self.tags.clone())
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.create_db_cluster(request).await
    }

    fn apply_response(&self, model: &mut DbCluster, response: DbClusterInfo) {
        model.db_cluster_arn = Some(response.db_cluster_arn);
        model.endpoint = response.endpoint.map(|address| Endpoint {
            address,
            port: response.port,
        });
    }

    async fn stabilize(&self, client: &Self::Client, model: &DbCluster) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Exists).await
    }
}

struct ModifyCluster<'a> {
    previous: &'a DbCluster,
    rollback: bool,
}

#[async_trait]
impl<'a> Mutation for ModifyCluster<'a> {
    type Model = DbCluster;
    type Client = dyn RdsClient;
    type Request = ModifyDbClusterRequest;
    type Response = DbClusterInfo;

    fn name(&self) -> &str {
        MODIFY_STEP
    }

    fn translate(&self, model: &DbCluster) -> Self::Request {
        translator::modify_request(self.previous, model, self.rollback)
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.modify_db_cluster(request).await
    }

    async fn stabilize(&self, client: &Self::Client, model: &DbCluster) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Exists).await
    }
}

struct DeleteCluster;

#[async_trait]
impl Mutation for DeleteCluster {
    type Model = DbCluster;
    type Client = dyn RdsClient;
    type Request = DeleteDbClusterRequest;
    type Response = DbClusterInfo;

    fn name(&self) -> &str {
        DELETE_STEP
    }

    fn translate(&self, model: &DbCluster) -> Self::Request {
        translator::delete_request(model)
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.delete_db_cluster(request).await
    }

    async fn stabilize(&self, client: &Self::Client, model: &DbCluster) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Gone).await
    }
}
