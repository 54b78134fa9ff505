use serde::{Deserialize, Serialize};

/// Link between a dashboard and the provisioning source that owns it.
///
/// The existence of a record for a dashboard id is the only "provisioned" signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRecord {
    /// Storage id of the link, assigned by persistence.
    pub id: i64,
    /// Dashboard the link points at, assigned by persistence on save.
    pub dashboard_id: i64,
    /// Provisioning source name.
    pub name: String,
    /// Path of the source file inside the provisioning source.
    pub external_id: String,
    /// Checksum of the source file at the time of the last sync.
    pub check_sum: String,
    /// Unix timestamp of the last sync.
    pub updated: i64,
}

impl ProvisioningRecord {
    /// Creates an unsaved record for a provisioning source file.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        external_id: impl Into<String>,
        check_sum: impl Into<String>,
        updated: i64,
    ) -> Self {
        Self {
            id: 0,
            dashboard_id: 0,
            name: name.into(),
            external_id: external_id.into(),
            check_sum: check_sum.into(),
            updated,
        }
    }
}
