//! Pipeline stages shared by the resource handlers.

use crate::identifier::generate_identifier;
use crate::model::{tags_from_map, tags_to_map, Tag};
use reconcile_framework::{
    exec_once, handle_exception, CallbackContext, ErrorRuleSet, FrameworkError, HandlerRequest, ProgressEvent,
    ProviderError, StepError, TagReconciler, TagSet, TaggingClient,
};
use reconcile_framework::tagging::reconcile;
use std::future::Future;
use std::time::Duration;

pub const CREATE_STEP: &str = "create";
pub const TAGS_STEP: &str = "update-tags";
pub const MODIFY_STEP: &str = "modify";
pub const DELETE_STEP: &str = "delete";

/// Context key of a generated physical name.
pub const IDENTIFIER_KEY: &str = "identifier";

/// The physical name for a create whose model has none.
///
/// The first invocation generates it and carries it in the context; resumed invocations reuse
/// the carried name as-is.
pub fn physical_name<M>(
    request: &HandlerRequest<M>,
    context: &mut CallbackContext,
    max_len: usize,
) -> Result<String, FrameworkError> {
    if let Some(name) = context.carried::<String>(IDENTIFIER_KEY)? {
        return Ok(name);
    }
    let name = generate_identifier(
        request.logical_resource_identifier.as_deref(),
        &request.client_request_token,
        max_len,
    );
    context.carry(IDENTIFIER_KEY, &name)?;
    Ok(name)
}

/// The merged tags a create request carries: system, then stack, then the model's own.
pub fn creation_tags<M>(request: &HandlerRequest<M>, resource_tags: &[Tag]) -> Vec<Tag> {
    let merged = request.desired_tags(tags_to_map(resource_tags)).merged();
    tags_from_map(&merged)
}

/// Previous and desired tag layers of an update.
pub fn tag_sets<M>(request: &HandlerRequest<M>, previous: &[Tag], desired: &[Tag]) -> (TagSet, TagSet) {
    (
        request.previous_tags(tags_to_map(previous)),
        request.desired_tags(tags_to_map(desired)),
    )
}

/// The gated tag update of an update pipeline.
///
/// `arn` is resolved first; a failure to resolve it is classified with `rules` like any other
/// provider error, while tagging failures themselves follow the relaxed tagging policy.
pub async fn update_tags_once<M, C, F>(
    client: &C,
    rules: &ErrorRuleSet,
    delay: Duration,
    progress: ProgressEvent<M>,
    arn: F,
    tags: (TagSet, TagSet),
) -> ProgressEvent<M>
where
    C: TaggingClient + ?Sized,
    F: Future<Output = Result<String, ProviderError>>,
{
    exec_once(TAGS_STEP, progress, |p| async move {
        let (previous, desired) = tags;
        if reconcile(&previous, &desired).is_empty() {
            return p;
        }
        match arn.await {
            Ok(arn) => {
                TagReconciler::new(rules)
                    .update_tags(client, &arn, p, &previous, &desired)
                    .await
            }
            Err(e) => handle_exception(p, &StepError::Provider(e), rules, delay),
        }
    })
    .await
}
