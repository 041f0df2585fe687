use super::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `AWS::RDS::DBClusterParameterGroup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbClusterParameterGroup {
    /// Generated from the logical identifier when not supplied.
    #[serde(rename = "DBClusterParameterGroupName", default, skip_serializing_if = "Option::is_none")]
    pub db_cluster_parameter_group_name: Option<String>,
    pub description: String,
    pub family: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DbClusterParameterGroup {
    pub fn new(family: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.db_cluster_parameter_group_name = Some(name.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn name(&self) -> &str {
        self.db_cluster_parameter_group_name.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_json_shape() {
        let model: DbClusterParameterGroup = serde_json::from_str(
            r#"{
                "DBClusterParameterGroupName": "pg-1",
                "Description": "sample description",
                "Family": "default.aurora.5",
                "Parameters": {"time_zone": "UTC"},
                "Tags": [{"Key": "key", "Value": "value"}]
            }"#,
        )
        .unwrap();

        assert_eq!(model.name(), "pg-1");
        assert_eq!(model.parameters.get("time_zone").map(String::as_str), Some("UTC"));
        assert_eq!(model.tags, vec![Tag::new("key", "value")]);
    }
}
