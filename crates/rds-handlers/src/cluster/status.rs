use reconcile_framework::ResourceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterStatus {
    Available,
    Creating,
    Modifying,
    BackingUp,
    Upgrading,
    Renaming,
    ResettingMasterCredentials,
    Maintenance,
    Starting,
    Deleting,
    Failed,
    InaccessibleEncryptionCredentials,
    IncompatibleParameters,
}

impl ResourceStatus for ClusterStatus {
    fn parse(status: &str) -> Option<Self> {
        let status = match status {
            "available" => ClusterStatus::Available,
            "creating" => ClusterStatus::Creating,
            "modifying" => ClusterStatus::Modifying,
            "backing-up" => ClusterStatus::BackingUp,
            "upgrading" => ClusterStatus::Upgrading,
            "renaming" => ClusterStatus::Renaming,
            "resetting-master-credentials" => ClusterStatus::ResettingMasterCredentials,
            "maintenance" => ClusterStatus::Maintenance,
            "starting" => ClusterStatus::Starting,
            "deleting" => ClusterStatus::Deleting,
            "failed" => ClusterStatus::Failed,
            "inaccessible-encryption-credentials" => ClusterStatus::InaccessibleEncryptionCredentials,
            "incompatible-parameters" => ClusterStatus::IncompatibleParameters,
            _ => return None,
        };
        Some(status)
    }

    fn is_stable(&self) -> bool {
        *self == ClusterStatus::Available
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClusterStatus::Failed
                | ClusterStatus::InaccessibleEncryptionCredentials
                | ClusterStatus::IncompatibleParameters
        )
    }
}
