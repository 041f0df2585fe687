//! # RDS Resource Handlers
//!
//! Resource adapters that plug three RDS resource types into the reconciliation engine of
//! [`reconcile_framework`].
//!
//! - **[parameter_group]**: `AWS::RDS::DBClusterParameterGroup`
//! - **[engine_version]**: `AWS::RDS::CustomDBEngineVersion`
//! - **[cluster]**: `AWS::RDS::DBCluster`
//! - **[model]**: the resource models, serialized with the provisioning schema's PascalCase names
//! - **[api]** and **[clients]**: the provisioning API shapes, the [`RdsClient`](clients::RdsClient)
//!   boundary and an in-memory implementation of it
//! - **[lifecycle]**: [`RdsSystem`](lifecycle::RdsSystem), which runs one handler service per
//!   resource type
//!
//! ## Testing
//!
//! [`InMemoryRds`](clients::InMemoryRds) simulates asynchronous mutations and records every call,
//! so tests can assert that a resumed operation never repeats a completed step.

pub mod api;
pub mod clients;
pub mod cluster;
mod common;
pub mod engine_version;
pub mod identifier;
pub mod lifecycle;
pub mod model;
pub mod parameter_group;

pub use common::{CREATE_STEP, DELETE_STEP, MODIFY_STEP, TAGS_STEP};
