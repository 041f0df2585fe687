use reconcile_framework::ResourceStatus;

/// Lifecycle states reported for a custom engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineVersionStatus {
    Available,
    Inactive,
    InactiveExceptRestore,
    Creating,
    PendingValidation,
    Validating,
    Deleting,
    Failed,
    IncompatibleImageConfiguration,
}

impl ResourceStatus for EngineVersionStatus {
    fn parse(status: &str) -> Option<Self> {
        let status = match status {
            "available" => EngineVersionStatus::Available,
            "inactive" => EngineVersionStatus::Inactive,
            "inactive-except-restore" => EngineVersionStatus::InactiveExceptRestore,
            "creating" => EngineVersionStatus::Creating,
            "pending-validation" => EngineVersionStatus::PendingValidation,
            "validating" => EngineVersionStatus::Validating,
            "deleting" => EngineVersionStatus::Deleting,
            "failed" => EngineVersionStatus::Failed,
            "incompatible-image-configuration" => EngineVersionStatus::IncompatibleImageConfiguration,
            _ => return None,
        };
        Some(status)
    }

    fn is_stable(&self) -> bool {
        matches!(
            self,
            EngineVersionStatus::Available
                | EngineVersionStatus::Inactive
                | EngineVersionStatus::InactiveExceptRestore
        )
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineVersionStatus::Failed | EngineVersionStatus::IncompatibleImageConfiguration
        )
    }
}
