//! # ResourceHandler Trait
//!
//! The contract every managed resource type implements to be served by the [`Orchestrator`].
//! A handler describes one pipeline per lifecycle operation; the engine supplies the request,
//! the resumed progress event and the provisioning client.
//!
//! Like the rest of the engine, handlers keep no state between invocations. Anything a later
//! invocation needs goes into the [`CallbackContext`](crate::context::CallbackContext) carried
//! by the progress event.
//!
//! [`Orchestrator`]: crate::engine::Orchestrator

use crate::progress::ProgressEvent;
use crate::tagging::{TagSet, Tags};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Create,
    Read,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "Create",
            OperationType::Read => "Read",
            OperationType::Update => "Update",
            OperationType::Delete => "Delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation's input. Identical for every invocation of a logical operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerRequest<M> {
    pub desired_resource_state: M,
    /// Present for updates (required) and for deletes issued during rollback.
    pub previous_resource_state: Option<M>,
    #[serde(default)]
    pub system_tags: Tags,
    #[serde(default)]
    pub previous_system_tags: Tags,
    /// Stack-level tags.
    #[serde(default)]
    pub desired_resource_tags: Tags,
    #[serde(default)]
    pub previous_resource_tags: Tags,
    pub logical_resource_identifier: Option<String>,
    pub client_request_token: String,
    #[serde(default)]
    pub rollback: bool,
}

impl<M> HandlerRequest<M> {
    pub fn new(desired_resource_state: M, client_request_token: impl Into<String>) -> Self {
        Self {
            desired_resource_state,
            previous_resource_state: None,
            system_tags: Tags::new(),
            previous_system_tags: Tags::new(),
            desired_resource_tags: Tags::new(),
            previous_resource_tags: Tags::new(),
            logical_resource_identifier: None,
            client_request_token: client_request_token.into(),
            rollback: false,
        }
    }

    pub fn with_previous(mut self, previous: M) -> Self {
        self.previous_resource_state = Some(previous);
        self
    }

    pub fn with_logical_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.logical_resource_identifier = Some(identifier.into());
        self
    }

    pub fn with_system_tags(mut self, desired: Tags, previous: Tags) -> Self {
        self.system_tags = desired;
        self.previous_system_tags = previous;
        self
    }

    pub fn with_stack_tags(mut self, desired: Tags, previous: Tags) -> Self {
        self.desired_resource_tags = desired;
        self.previous_resource_tags = previous;
        self
    }

    /// The desired tag layers, given the resource's own tags from the desired model.
    pub fn desired_tags(&self, resource_tags: Tags) -> TagSet {
        TagSet::new(self.system_tags.clone(), self.desired_resource_tags.clone(), resource_tags)
    }

    /// The previous tag layers, given the resource's own tags from the previous model.
    pub fn previous_tags(&self, resource_tags: Tags) -> TagSet {
        TagSet::new(
            self.previous_system_tags.clone(),
            self.previous_resource_tags.clone(),
            resource_tags,
        )
    }
}

/// A managed resource type.
///
/// Each operation receives the progress event to resume from (a fresh one at the start of a
/// logical operation) and returns the event for this invocation. Provider failures must be
/// classified into the returned event, never propagated.
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    type Model: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The provisioning client, injected when the service starts.
    type Client: ?Sized + Send + Sync + 'static;

    /// Used in logs, e.g. `AWS::RDS::DBCluster`.
    const TYPE_NAME: &'static str;

    async fn create(
        &self,
        request: &HandlerRequest<Self::Model>,
        progress: ProgressEvent<Self::Model>,
        client: &Self::Client,
    ) -> ProgressEvent<Self::Model>;

    async fn read(
        &self,
        request: &HandlerRequest<Self::Model>,
        progress: ProgressEvent<Self::Model>,
        client: &Self::Client,
    ) -> ProgressEvent<Self::Model>;

    async fn update(
        &self,
        request: &HandlerRequest<Self::Model>,
        progress: ProgressEvent<Self::Model>,
        client: &Self::Client,
    ) -> ProgressEvent<Self::Model>;

    async fn delete(
        &self,
        request: &HandlerRequest<Self::Model>,
        progress: ProgressEvent<Self::Model>,
        client: &Self::Client,
    ) -> ProgressEvent<Self::Model>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_layers_from_request() {
        let request = HandlerRequest::new("model", "token-1")
            .with_system_tags(
                Tags::from([("aws:stack".to_string(), "s2".to_string())]),
                Tags::from([("aws:stack".to_string(), "s1".to_string())]),
            )
            .with_stack_tags(Tags::from([("team".to_string(), "db".to_string())]), Tags::new());

        let desired = request.desired_tags(Tags::from([("env".to_string(), "prod".to_string())]));
        let previous = request.previous_tags(Tags::new());

        assert_eq!(desired.merged().len(), 3);
        assert_eq!(previous.merged().get("aws:stack").map(String::as_str), Some("s1"));
    }

    #[test]
    fn test_request_deserializes_with_missing_optional_layers() {
        let request: HandlerRequest<String> = serde_json::from_str(
            r#"{
                "desired_resource_state": "m",
                "previous_resource_state": null,
                "logical_resource_identifier": "MyCluster",
                "client_request_token": "t"
            }"#,
        )
        .unwrap();

        assert!(request.system_tags.is_empty());
        assert!(!request.rollback);
        assert_eq!(request.logical_resource_identifier.as_deref(), Some("MyCluster"));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(OperationType::Delete.to_string(), "Delete");
    }
}
