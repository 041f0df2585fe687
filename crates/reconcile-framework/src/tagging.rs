//! # Tag Reconciler
//!
//! Tags arrive in three layers: system tags injected by the platform, stack tags scoped to the
//! deployment, and the resource's own tags. Each layer is merged in that order, later layers
//! overriding earlier ones, and the previous and desired merges are compared pair by pair.
//!
//! Tagging is best effort. When the resource is in the middle of another mutation the provider
//! rejects tag changes with a conflict; that failure is recorded as a soft failure and the
//! operation moves on. Any other tagging failure fails the operation.

use crate::context::CallbackContext;
use crate::error::{HandlerErrorCode, ProviderError};
use crate::progress::ProgressEvent;
use crate::rules::{ErrorRuleSet, ErrorStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    pub system_tags: Tags,
    pub stack_tags: Tags,
    pub resource_tags: Tags,
}

impl TagSet {
    pub fn new(system_tags: Tags, stack_tags: Tags, resource_tags: Tags) -> Self {
        Self {
            system_tags,
            stack_tags,
            resource_tags,
        }
    }

    /// System, then stack, then resource tags; later layers win on key collision.
    pub fn merged(&self) -> Tags {
        let mut merged = self.system_tags.clone();
        merged.extend(self.stack_tags.clone());
        merged.extend(self.resource_tags.clone());
        merged
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub to_add: Tags,
    pub to_remove: Tags,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn keys_to_remove(&self) -> BTreeSet<String> {
        self.to_remove.keys().cloned().collect()
    }
}

/// Pairs in `desired` missing from `previous` are added, pairs in `previous` missing from
/// `desired` are removed. A changed value shows up on both sides.
pub fn reconcile(previous: &TagSet, desired: &TagSet) -> TagDiff {
    let previous = previous.merged();
    let desired = desired.merged();
    TagDiff {
        to_add: exclude(&desired, &previous),
        to_remove: exclude(&previous, &desired),
    }
}

fn exclude(from: &Tags, other: &Tags) -> Tags {
    from.iter()
        .filter(|(key, value)| other.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The tag API of a provisioning service.
#[async_trait]
pub trait TaggingClient: Send + Sync {
    async fn add_tags(&self, arn: &str, tags: &Tags) -> Result<(), ProviderError>;

    async fn remove_tags(&self, arn: &str, keys: &BTreeSet<String>) -> Result<(), ProviderError>;
}

pub struct TagReconciler<'a> {
    rules: &'a ErrorRuleSet,
}

impl<'a> TagReconciler<'a> {
    /// `rules` is the resource type's rule set; its verdicts are relaxed for tagging.
    pub fn new(rules: &'a ErrorRuleSet) -> Self {
        Self { rules }
    }

    /// Removes stale tags, then adds new ones. Skips the provider entirely when nothing changed.
    #[instrument(skip(self, client, progress, previous, desired))]
    pub async fn update_tags<M, C>(
        &self,
        client: &C,
        arn: &str,
        progress: ProgressEvent<M>,
        previous: &TagSet,
        desired: &TagSet,
    ) -> ProgressEvent<M>
    where
        C: TaggingClient + ?Sized,
    {
        let diff = reconcile(previous, desired);
        if diff.is_empty() {
            debug!("Tags unchanged");
            return progress;
        }
        debug!(to_add = ?diff.to_add, to_remove = ?diff.to_remove, "Reconciling tags");

        let result = async {
            if !diff.to_remove.is_empty() {
                client.remove_tags(arn, &diff.keys_to_remove()).await?;
            }
            if !diff.to_add.is_empty() {
                client.add_tags(arn, &diff.to_add).await?;
            }
            Ok::<_, ProviderError>(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(added = diff.to_add.len(), removed = diff.to_remove.len(), "Tags updated");
                progress
            }
            Err(e) => self.on_tagging_error(progress, e),
        }
    }

    fn on_tagging_error<M>(&self, progress: ProgressEvent<M>, error: ProviderError) -> ProgressEvent<M> {
        let ProgressEvent {
            resource_model: model,
            callback_context: mut context,
            ..
        } = progress;
        match tagging_error_status(self.rules, &error) {
            ErrorStatus::Ignore => {
                warn!(error = %error, "Tagging skipped while the resource is busy");
                context.record_soft_failure(format!("Tagging skipped: {error}"));
                ProgressEvent::progress(model, context)
            }
            ErrorStatus::Fail(code) | ErrorStatus::Retry(code) => {
                warn!(error_code = %code, error = %error, "Tagging failed");
                fail(model, context, code, &error)
            }
        }
    }
}

fn fail<M>(model: M, context: CallbackContext, code: HandlerErrorCode, error: &ProviderError) -> ProgressEvent<M> {
    ProgressEvent::failed(model, context, code, error.message.clone())
}

/// The relaxed verdict on a tagging failure: a conflict with an in-flight mutation is ignored,
/// anything else is terminal.
pub fn tagging_error_status(rules: &ErrorRuleSet, error: &ProviderError) -> ErrorStatus {
    match rules.classify(error) {
        ErrorStatus::Ignore
        | ErrorStatus::Retry(HandlerErrorCode::ResourceConflict)
        | ErrorStatus::Fail(HandlerErrorCode::ResourceConflict) => ErrorStatus::Ignore,
        ErrorStatus::Retry(code) | ErrorStatus::Fail(code) => ErrorStatus::Fail(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::CallRecorder;
    use crate::rules::DEFAULT_ERROR_RULE_SET;
    use std::sync::Mutex;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resource_only(pairs: &[(&str, &str)]) -> TagSet {
        TagSet::new(Tags::new(), Tags::new(), tags(pairs))
    }

    #[derive(Default)]
    struct FakeTagging {
        recorder: CallRecorder,
        added: Mutex<Vec<Tags>>,
        removed: Mutex<Vec<BTreeSet<String>>>,
    }

    #[async_trait]
    impl TaggingClient for FakeTagging {
        async fn add_tags(&self, _arn: &str, tags: &Tags) -> Result<(), ProviderError> {
            self.recorder.record("AddTagsToResource")?;
            self.added.lock().unwrap().push(tags.clone());
            Ok(())
        }

        async fn remove_tags(&self, _arn: &str, keys: &BTreeSet<String>) -> Result<(), ProviderError> {
            self.recorder.record("RemoveTagsFromResource")?;
            self.removed.lock().unwrap().push(keys.clone());
            Ok(())
        }
    }

    #[test]
    fn test_diff_examples() {
        let diff = reconcile(
            &resource_only(&[("a", "1"), ("b", "2")]),
            &resource_only(&[("b", "2"), ("c", "3")]),
        );
        assert_eq!(diff.to_add, tags(&[("c", "3")]));
        assert_eq!(diff.to_remove, tags(&[("a", "1")]));

        let same = resource_only(&[("a", "1")]);
        assert!(reconcile(&same, &same).is_empty());
    }

    #[test]
    fn test_changed_value_is_removed_and_re_added() {
        let diff = reconcile(&resource_only(&[("env", "dev")]), &resource_only(&[("env", "prod")]));
        assert_eq!(diff.to_remove, tags(&[("env", "dev")]));
        assert_eq!(diff.to_add, tags(&[("env", "prod")]));
    }

    #[test]
    fn test_later_layers_override_on_merge() {
        let set = TagSet::new(
            tags(&[("owner", "platform"), ("aws:stack", "s1")]),
            tags(&[("owner", "stack")]),
            tags(&[("owner", "me")]),
        );
        assert_eq!(set.merged(), tags(&[("aws:stack", "s1"), ("owner", "me")]));
    }

    #[tokio::test]
    async fn test_remove_is_issued_before_add() {
        let client = FakeTagging::default();
        let reconciler = TagReconciler::new(&DEFAULT_ERROR_RULE_SET);

        let event = reconciler
            .update_tags(
                &client,
                "arn:test",
                ProgressEvent::progress((), CallbackContext::new()),
                &resource_only(&[("a", "1"), ("b", "2")]),
                &resource_only(&[("b", "2"), ("c", "3")]),
            )
            .await;

        assert!(event.can_continue());
        assert_eq!(
            client.recorder.calls(),
            vec!["RemoveTagsFromResource".to_string(), "AddTagsToResource".to_string()]
        );
        assert_eq!(client.removed.lock().unwrap()[0], BTreeSet::from(["a".to_string()]));
    }

    #[tokio::test]
    async fn test_unchanged_tags_make_no_calls() {
        let client = FakeTagging::default();
        let reconciler = TagReconciler::new(&DEFAULT_ERROR_RULE_SET);
        let same = resource_only(&[("a", "1")]);

        reconciler
            .update_tags(&client, "arn:test", ProgressEvent::progress((), CallbackContext::new()), &same, &same)
            .await;

        assert!(client.recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_is_a_soft_failure() {
        let client = FakeTagging::default();
        client
            .recorder
            .expect("AddTagsToResource")
            .return_err(ProviderError::new("ConflictException", "cluster is modifying"));
        let reconciler = TagReconciler::new(&DEFAULT_ERROR_RULE_SET);

        let event = reconciler
            .update_tags(
                &client,
                "arn:test",
                ProgressEvent::progress((), CallbackContext::new()),
                &TagSet::default(),
                &resource_only(&[("a", "1")]),
            )
            .await;

        assert!(event.can_continue());
        assert_eq!(event.callback_context.soft_failures().len(), 1);
        client.recorder.verify();
    }

    #[tokio::test]
    async fn test_other_tagging_errors_fail_hard() {
        let client = FakeTagging::default();
        client
            .recorder
            .expect("RemoveTagsFromResource")
            .return_err(ProviderError::new("AccessDeniedException", "not allowed"));
        let reconciler = TagReconciler::new(&DEFAULT_ERROR_RULE_SET);

        let event = reconciler
            .update_tags(
                &client,
                "arn:test",
                ProgressEvent::progress((), CallbackContext::new()),
                &resource_only(&[("a", "1")]),
                &TagSet::default(),
            )
            .await;

        assert!(event.is_failed());
        assert_eq!(event.error_code, Some(HandlerErrorCode::AccessDenied));
        assert_eq!(client.recorder.count("AddTagsToResource"), 0);
    }

    #[test]
    fn test_throttling_is_terminal_for_tagging() {
        let error = ProviderError::new("ThrottlingException", "slow down");
        assert_eq!(
            tagging_error_status(&DEFAULT_ERROR_RULE_SET, &error),
            ErrorStatus::Fail(HandlerErrorCode::Throttling)
        );
    }
}
