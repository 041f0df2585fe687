//! Conversions between [`DbClusterParameterGroup`] and the parameter group API shapes.

use crate::api::{
    ApplyMethod, CreateDbClusterParameterGroupRequest, DbClusterParameterGroupInfo,
    ModifyDbClusterParameterGroupRequest, Parameter, ResetDbClusterParameterGroupRequest,
    MAX_PARAMETERS_PER_REQUEST,
};
use crate::model::{DbClusterParameterGroup, Tag};

pub fn create_request(model: &DbClusterParameterGroup, tags: Vec<Tag>) -> CreateDbClusterParameterGroupRequest {
    CreateDbClusterParameterGroupRequest {
        db_cluster_parameter_group_name: model.name().to_string(),
        db_parameter_group_family: model.family.clone(),
        description: model.description.clone(),
        tags,
    }
}

/// The desired parameters split into modify calls the service accepts.
pub fn modify_requests(model: &DbClusterParameterGroup) -> Vec<ModifyDbClusterParameterGroupRequest> {
    let parameters: Vec<Parameter> = model
        .parameters
        .iter()
        .map(|(name, value)| Parameter {
            parameter_name: name.clone(),
            parameter_value: value.clone(),
            apply_method: ApplyMethod::PendingReboot,
        })
        .collect();

    parameters
        .chunks(MAX_PARAMETERS_PER_REQUEST)
        .map(|batch| ModifyDbClusterParameterGroupRequest {
            db_cluster_parameter_group_name: model.name().to_string(),
            parameters: batch.to_vec(),
        })
        .collect()
}

pub fn reset_request(model: &DbClusterParameterGroup) -> ResetDbClusterParameterGroupRequest {
    ResetDbClusterParameterGroupRequest {
        db_cluster_parameter_group_name: model.name().to_string(),
        reset_all_parameters: true,
        parameters: Vec::new(),
    }
}

/// Whether the parameter set changed between the two snapshots.
pub fn should_update_parameters(previous: &DbClusterParameterGroup, desired: &DbClusterParameterGroup) -> bool {
    previous.parameters != desired.parameters
}

pub fn model_from(info: DbClusterParameterGroupInfo, parameters: Vec<Parameter>, tags: Vec<Tag>) -> DbClusterParameterGroup {
    DbClusterParameterGroup {
        db_cluster_parameter_group_name: Some(info.db_cluster_parameter_group_name),
        description: info.description,
        family: info.db_parameter_group_family,
        parameters: parameters
            .into_iter()
            .map(|p| (p.parameter_name, p.parameter_value))
            .collect(),
        tags,
    }
}
