//! [`ResourceHandler`] implementation for [`DbClusterParameterGroup`].
//!
//! Parameter group mutations settle synchronously, so none of these steps wait for
//! stabilization. The update pipeline is the interesting one:
//!
//! 1. tags (gated),
//! 2. reset all parameters, only when the parameter set changed, and re-run on every invocation
//!    until the apply step has completed,
//! 3. apply the desired parameters in batches (gated),
//! 4. read back the final state.

use super::{translator, PARAMETER_GROUP_RULES};
use crate::api::{
    CreateDbClusterParameterGroupRequest, DbClusterParameterGroupInfo, ModifyDbClusterParameterGroupRequest,
    ResetDbClusterParameterGroupRequest,
};
use crate::clients::RdsClient;
use crate::common::{creation_tags, physical_name, tag_sets, update_tags_once, CREATE_STEP, DELETE_STEP, TAGS_STEP};
use crate::model::{DbClusterParameterGroup, Tag};
use async_trait::async_trait;
use reconcile_framework::{
    exec_once, CallbackContext, HandlerConfig, HandlerErrorCode, HandlerRequest, Mutation, ProgressEvent, ProviderError,
    ResourceHandler, StepError, StepExecutor,
};
use tracing::{info, instrument};

pub const APPLY_STEP: &str = "apply-parameters";
pub const RESET_STEP: &str = "reset-parameters";

/// Parameter group names may be up to 255 characters.
const MAX_NAME_LEN: usize = 255;

/// Where an update resumes, derived from the completion flags in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdatePhase {
    Init,
    TagsUpdated,
    ParametersApplied,
}

impl UpdatePhase {
    pub fn resume_point(context: &CallbackContext) -> Self {
        if context.is_complete(APPLY_STEP) {
            UpdatePhase::ParametersApplied
        } else if context.is_complete(TAGS_STEP) {
            UpdatePhase::TagsUpdated
        } else {
            UpdatePhase::Init
        }
    }
}

pub struct ParameterGroupHandler {
    config: HandlerConfig,
}

impl ParameterGroupHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self { config }
    }

    fn executor(&self) -> StepExecutor<'static> {
        StepExecutor::new(&self.config, &PARAMETER_GROUP_RULES)
    }

    /// Describes the group, its user parameters and its tags.
    async fn read_current(
        &self,
        client: &dyn RdsClient,
        progress: ProgressEvent<DbClusterParameterGroup>,
    ) -> ProgressEvent<DbClusterParameterGroup> {
        let name = progress.resource_model.name().to_string();
        let current = async {
            let info = client.describe_db_cluster_parameter_groups(&name).await?;
            let parameters = client.describe_db_cluster_parameters(&name).await?;
            let tags = client
                .list_tags_for_resource(&info.db_cluster_parameter_group_arn)
                .await?;
            Ok::<_, ProviderError>(translator::model_from(info, parameters, tags))
        }
        .await;

        match current {
            Ok(model) => ProgressEvent::success(model, progress.callback_context),
            Err(e) => self.executor().handle(progress, &StepError::Provider(e)),
        }
    }
}

impl Default for ParameterGroupHandler {
    fn default() -> Self {
        Self::new(super::config())
    }
}

#[async_trait]
impl ResourceHandler for ParameterGroupHandler {
    type Model = DbClusterParameterGroup;
    type Client = dyn RdsClient;

    const TYPE_NAME: &'static str = "AWS::RDS::DBClusterParameterGroup";

    async fn create(
        &self,
        request: &HandlerRequest<DbClusterParameterGroup>,
        mut progress: ProgressEvent<DbClusterParameterGroup>,
        client: &Self::Client,
    ) -> ProgressEvent<DbClusterParameterGroup> {
        if progress.resource_model.db_cluster_parameter_group_name.is_none() {
            match physical_name(request, &mut progress.callback_context, MAX_NAME_LEN) {
                Ok(name) => progress.resource_model.db_cluster_parameter_group_name = Some(name),
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
        let create = &CreateParameterGroup {
            tags: creation_tags(request, &request.desired_resource_state.tags),
        };

        progress
            .then(move |p| exec_once(CREATE_STEP, p, move |p| executor.execute(create, client, p)))
            .await
            .then(move |p| exec_once(APPLY_STEP, p, move |p| executor.execute(&ApplyParameters, client, p)))
            .await
            .then(move |p| self.read_current(client, p))
            .await
    }

    #[instrument(skip_all, fields(name = %progress.resource_model.name()))]
    async fn read(
        &self,
        _request: &HandlerRequest<DbClusterParameterGroup>,
        progress: ProgressEvent<DbClusterParameterGroup>,
        client: &Self::Client,
    ) -> ProgressEvent<DbClusterParameterGroup> {
        self.read_current(client, progress).await
    }

    async fn update(
        &self,
        request: &HandlerRequest<DbClusterParameterGroup>,
        mut progress: ProgressEvent<DbClusterParameterGroup>,
        client: &Self::Client,
    ) -> ProgressEvent<DbClusterParameterGroup> {
        let desired = &request.desired_resource_state;
        let previous = request.previous_resource_state.as_ref().unwrap_or(desired);
        if progress.resource_model.db_cluster_parameter_group_name.is_none() {
            progress.resource_model.db_cluster_parameter_group_name =
                previous.db_cluster_parameter_group_name.clone();
        }

        let should_update = translator::should_update_parameters(previous, desired);
        let phase = UpdatePhase::resume_point(&progress.callback_context);
        info!(?phase, should_update, "Updating parameter group");

        let executor = &self.executor();
        let name = progress.resource_model.name().to_string();
        let arn = async {
            client
                .describe_db_cluster_parameter_groups(&name)
                .await
                .map(|info| info.db_cluster_parameter_group_arn)
        };

        update_tags_once(
            client,
            &PARAMETER_GROUP_RULES,
            executor.delay(),
            progress,
            arn,
            tag_sets(request, &previous.tags, &desired.tags),
        )
        .await
        .then(move |p| async move {
            if should_update && !p.callback_context.is_complete(APPLY_STEP) {
                executor.execute(&ResetParameters, client, p).await
            } else {
                p
            }
        })
        .await
        .then(move |p| async move {
            if should_update {
                exec_once(APPLY_STEP, p, move |p| executor.execute(&ApplyParameters, client, p)).await
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
        _request: &HandlerRequest<DbClusterParameterGroup>,
        progress: ProgressEvent<DbClusterParameterGroup>,
        client: &Self::Client,
    ) -> ProgressEvent<DbClusterParameterGroup> {
        self.executor()
            .execute(&DeleteParameterGroup, client, progress)
            .await
            .then(|p| async move { ProgressEvent::success(p.resource_model, p.callback_context) })
            .await
    }
}

struct CreateParameterGroup {
    tags: Vec<Tag>,
}

#[async_trait]
impl Mutation for CreateParameterGroup {
    type Model = DbClusterParameterGroup;
    type Client = dyn RdsClient;
    type Request = CreateDbClusterParameterGroupRequest;
    type Response = DbClusterParameterGroupInfo;

    fn name(&self) -> &str {
        CREATE_STEP
    }

    fn translate(&self, model: &DbClusterParameterGroup) -> Self::Request {
        translator::create_request(model, self.tags.clone())
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.create_db_cluster_parameter_group(request).await
    }
}

struct ApplyParameters;

#[async_trait]
impl Mutation for ApplyParameters {
    type Model = DbClusterParameterGroup;
    type Client = dyn RdsClient;
    type Request = Vec<ModifyDbClusterParameterGroupRequest>;
    type Response = ();

    fn name(&self) -> &str {
        APPLY_STEP
    }

    fn translate(&self, model: &DbClusterParameterGroup) -> Self::Request {
        translator::modify_requests(model)
    }

    async fn invoke(&self, client: &Self::Client, batches: Self::Request) -> Result<(), ProviderError> {
        for batch in batches {
            client.modify_db_cluster_parameter_group(batch).await?;
        }
        Ok(())
    }
}

struct ResetParameters;

#[async_trait]
impl Mutation for ResetParameters {
    type Model = DbClusterParameterGroup;
    type Client = dyn RdsClient;
    type Request = ResetDbClusterParameterGroupRequest;
    type Response = ();

    fn name(&self) -> &str {
        RESET_STEP
    }

    fn translate(&self, model: &DbClusterParameterGroup) -> Self::Request {
        translator::reset_request(model)
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<(), ProviderError> {
        client.reset_db_cluster_parameter_group(request).await
    }
}

struct DeleteParameterGroup;

#[async_trait]
impl Mutation for DeleteParameterGroup {
    type Model = DbClusterParameterGroup;
    type Client = dyn RdsClient;
    type Request = String;
    type Response = ();

    fn name(&self) -> &str {
        DELETE_STEP
    }

    fn translate(&self, model: &DbClusterParameterGroup) -> String {
        model.name().to_string()
    }

    async fn invoke(&self, client: &Self::Client, name: String) -> Result<(), ProviderError> {
        client.delete_db_cluster_parameter_group(&name).await
    }
}
