use async_trait::async_trait;
use dashsync_core::{AppResult, OrgId};
use dashsync_domain::{Dashboard, ProvisioningRecord};

use super::{SaveDashboardCommand, ValidateDashboardBeforeSaveResult};

/// Repository port for dashboard persistence and provisioning links.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Persists a dashboard and returns the stored version.
    async fn save_dashboard(&self, command: SaveDashboardCommand) -> AppResult<Dashboard>;

    /// Persists a dashboard and upserts its provisioning link atomically.
    async fn save_provisioned_dashboard(
        &self,
        command: SaveDashboardCommand,
        provisioning: ProvisioningRecord,
    ) -> AppResult<Dashboard>;

    /// Deletes a dashboard, its children when it is a folder, and its provisioning link.
    async fn delete_dashboard(&self, org_id: OrgId, dashboard_id: i64) -> AppResult<()>;

    /// Finds a dashboard by numeric id in any organization.
    async fn find_dashboard_by_id(&self, dashboard_id: i64) -> AppResult<Option<Dashboard>>;

    /// Lists provisioning links created by a provisioning source.
    async fn list_provisioned_dashboard_data(
        &self,
        name: &str,
    ) -> AppResult<Vec<ProvisioningRecord>>;

    /// Finds the provisioning link of a dashboard.
    async fn find_provisioned_dashboard_data_by_dashboard_id(
        &self,
        dashboard_id: i64,
    ) -> AppResult<Option<ProvisioningRecord>>;

    /// Removes the provisioning link of a dashboard and leaves the dashboard in place.
    async fn unprovision_dashboard(&self, dashboard_id: i64) -> AppResult<()>;

    /// Rejects conflicting writes and reports whether the parent folder changes.
    async fn validate_dashboard_before_save(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        overwrite: bool,
    ) -> AppResult<ValidateDashboardBeforeSaveResult>;
}
