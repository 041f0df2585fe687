//! # Resource Models
//!
//! The caller-visible shapes of the managed resources. Field names serialize in PascalCase, the
//! way resource properties are written in templates.

mod cluster;
mod engine_version;
mod parameter_group;
mod tag;

pub use cluster::{DbCluster, Endpoint, ScalingConfiguration};
pub use engine_version::CustomDbEngineVersion;
pub use parameter_group::DbClusterParameterGroup;
pub use tag::{tags_from_map, tags_to_map, Tag};
