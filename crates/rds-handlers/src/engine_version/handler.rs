//! [`ResourceHandler`] implementation for [`CustomDbEngineVersion`].
//!
//! Creating a custom engine version validates the installation media and takes hours; every
//! mutation here is therefore followed by a status check, and a not-yet-available version
//! suspends the pipeline until the next invocation.

use super::{translator, EngineVersionStatus, ENGINE_VERSION_RULES};
use crate::api::{
    faults, CreateCustomDbEngineVersionRequest, DbEngineVersionInfo, ModifyCustomDbEngineVersionRequest,
};
use crate::clients::RdsClient;
use crate::common::{creation_tags, tag_sets, update_tags_once, CREATE_STEP, DELETE_STEP, MODIFY_STEP};
use crate::model::{CustomDbEngineVersion, Tag};
use async_trait::async_trait;
use reconcile_framework::{
    exec_once, HandlerConfig, HandlerRequest, Mutation, PollTarget, ProgressEvent, ProviderError, ResourceHandler,
    StabilizationPoller, StepError, StepExecutor,
};
use tracing::instrument;

const CREATED_STATUS: &str = "available";

pub struct EngineVersionHandler {
    config: HandlerConfig,
}

impl EngineVersionHandler {
    pub fn new(config: HandlerConfig) -> Self {
        Self { config }
    }

    fn executor(&self) -> StepExecutor<'static> {
        StepExecutor::new(&self.config, &ENGINE_VERSION_RULES)
    }

    async fn read_current(
        &self,
        client: &dyn RdsClient,
        progress: ProgressEvent<CustomDbEngineVersion>,
    ) -> ProgressEvent<CustomDbEngineVersion> {
        let model = &progress.resource_model;
        let current = async {
            let info = describe(client, model).await?;
            let tags = client.list_tags_for_resource(&info.db_engine_version_arn).await?;
            Ok::<_, ProviderError>(translator::model_from(info, tags))
        }
        .await;

        match current {
            Ok(model) => ProgressEvent::success(model, progress.callback_context),
            Err(e) => self.executor().handle(progress, &StepError::Provider(e)),
        }
    }
}

impl Default for EngineVersionHandler {
    fn default() -> Self {
        Self::new(super::config())
    }
}

/// The single version matching the model's engine and version.
async fn describe(client: &dyn RdsClient, model: &CustomDbEngineVersion) -> Result<DbEngineVersionInfo, ProviderError> {
    client
        .describe_db_engine_versions(&model.engine, &model.engine_version)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ProviderError::new(
                faults::CUSTOM_DB_ENGINE_VERSION_NOT_FOUND,
                format!("Custom engine version {} not found", model.identifier()),
            )
        })
}

async fn poll(client: &dyn RdsClient, model: &CustomDbEngineVersion, target: PollTarget) -> Result<bool, StepError> {
    let fetch = async {
        let versions = client
            .describe_db_engine_versions(&model.engine, &model.engine_version)
            .await?;
        Ok::<_, ProviderError>(versions.into_iter().next().map(|version| version.status))
    };
    StabilizationPoller::new(&ENGINE_VERSION_RULES, target)
        .poll::<EngineVersionStatus, _>(&model.identifier(), fetch)
        .await
}

#[async_trait]
impl ResourceHandler for EngineVersionHandler {
    type Model = CustomDbEngineVersion;
    type Client = dyn RdsClient;

    const TYPE_NAME: &'static str = "AWS::RDS::CustomDBEngineVersion";

    #[instrument(skip_all, fields(identifier = %progress.resource_model.identifier()))]
    async fn create(
        &self,
        request: &HandlerRequest<CustomDbEngineVersion>,
        progress: ProgressEvent<CustomDbEngineVersion>,
        client: &Self::Client,
    ) -> ProgressEvent<CustomDbEngineVersion> {
        let desired = &request.desired_resource_state;
        let executor = &self.executor();
        let create = &CreateEngineVersion {
            tags: creation_tags(request, &desired.tags),
        };
        // A new version always comes up available; any other desired status takes a modify.
        let created = &CustomDbEngineVersion {
            status: Some(CREATED_STATUS.to_string()),
            ..desired.clone()
        };
        let set_status = translator::modify_request(created, desired).has_changes();
        let modify = &ModifyEngineVersion { previous: created };

        progress
            .then(move |p| exec_once(CREATE_STEP, p, move |p| executor.execute(create, client, p)))
            .await
            .then(move |p| async move {
                if set_status {
                    exec_once(MODIFY_STEP, p, move |p| executor.execute(modify, client, p)).await
                } else {
                    p
                }
            })
            .await
            .then(move |p| self.read_current(client, p))
            .await
    }

    async fn read(
        &self,
        _request: &HandlerRequest<CustomDbEngineVersion>,
        progress: ProgressEvent<CustomDbEngineVersion>,
        client: &Self::Client,
    ) -> ProgressEvent<CustomDbEngineVersion> {
        self.read_current(client, progress).await
    }

    #[instrument(skip_all, fields(identifier = %progress.resource_model.identifier()))]
    async fn update(
        &self,
        request: &HandlerRequest<CustomDbEngineVersion>,
        progress: ProgressEvent<CustomDbEngineVersion>,
        client: &Self::Client,
    ) -> ProgressEvent<CustomDbEngineVersion> {
        let desired = &request.desired_resource_state;
        let previous = request.previous_resource_state.as_ref().unwrap_or(desired);
        let has_changes = translator::modify_request(previous, desired).has_changes();

        let executor = &self.executor();
        let modify = &ModifyEngineVersion { previous };
        let model = progress.resource_model.clone();
        let arn = async move { describe(client, &model).await.map(|info| info.db_engine_version_arn) };

        update_tags_once(
            client,
            &ENGINE_VERSION_RULES,
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

    #[instrument(skip_all, fields(identifier = %progress.resource_model.identifier()))]
    async fn delete(
        &self,
        _request: &HandlerRequest<CustomDbEngineVersion>,
        progress: ProgressEvent<CustomDbEngineVersion>,
        client: &Self::Client,
    ) -> ProgressEvent<CustomDbEngineVersion> {
        self.executor()
            .execute(&DeleteEngineVersion, client, progress)
            .await
            .then(|p| async move { ProgressEvent::success(p.resource_model, p.callback_context) })
            .await
    }
}

struct CreateEngineVersion {
    tags: Vec<Tag>,
}

#[async_trait]
impl Mutation for CreateEngineVersion {
    type Model = CustomDbEngineVersion;
    type Client = dyn RdsClient;
    type Request = CreateCustomDbEngineVersionRequest;
    type Response = DbEngineVersionInfo;

    fn name(&self) -> &str {
        CREATE_STEP
    }

    fn translate(&self, model: &CustomDbEngineVersion) -> Self::Request {
        translator::create_request(model, self.tags.clone())
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.create_custom_db_engine_version(request).await
    }

    fn apply_response(&self, model: &mut CustomDbEngineVersion, response: DbEngineVersionInfo) {
        model.db_engine_version_arn = Some(response.db_engine_version_arn);
    }

    async fn stabilize(&self, client: &Self::Client, model: &CustomDbEngineVersion) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Exists).await
    }
}

struct ModifyEngineVersion<'a> {
    previous: &'a CustomDbEngineVersion,
}

#[async_trait]
impl<'a> Mutation for ModifyEngineVersion<'a> {
    type Model = CustomDbEngineVersion;
    type Client = dyn RdsClient;
    type Request = ModifyCustomDbEngineVersionRequest;
    type Response = DbEngineVersionInfo;

    fn name(&self) -> &str {
        MODIFY_STEP
    }

    fn translate(&self, model: &CustomDbEngineVersion) -> Self::Request {
        translator::modify_request(self.previous, model)
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        client.modify_custom_db_engine_version(request).await
    }

    async fn stabilize(&self, client: &Self::Client, model: &CustomDbEngineVersion) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Exists).await
    }
}

struct DeleteEngineVersion;

#[async_trait]
impl Mutation for DeleteEngineVersion {
    type Model = CustomDbEngineVersion;
    type Client = dyn RdsClient;
    type Request = (String, String);
    type Response = DbEngineVersionInfo;

    fn name(&self) -> &str {
        DELETE_STEP
    }

    fn translate(&self, model: &CustomDbEngineVersion) -> Self::Request {
        (model.engine.clone(), model.engine_version.clone())
    }

    async fn invoke(&self, client: &Self::Client, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let (engine, version) = request;
        client.delete_custom_db_engine_version(&engine, &version).await
    }

    async fn stabilize(&self, client: &Self::Client, model: &CustomDbEngineVersion) -> Result<bool, StepError> {
        poll(client, model, PollTarget::Gone).await
    }
}
