use dashsync_core::{AppResult, OrgId, SignedInUser};
use dashsync_domain::{Dashboard, ProvisioningRecord};
use tracing::info;

use super::DashboardService;
use crate::SaveDashboardInput;

impl DashboardService {
    /// Saves a dashboard on behalf of a provisioning source and links it to the source.
    ///
    /// Runs as a synthetic administrator of the request's organization and skips the provisioned
    /// ownership check, since the source is saving its own dashboard.
    pub async fn save_provisioned_dashboard(
        &self,
        mut input: SaveDashboardInput,
        provisioning: ProvisioningRecord,
    ) -> AppResult<Dashboard> {
        input.user = SignedInUser::provisioning_admin(input.org_id);

        let command = self.command_builder.build(&mut input, true, false).await?;
        let dashboard = self
            .repository
            .save_provisioned_dashboard(command, provisioning)
            .await?;
        info!(
            org_id = %input.org_id,
            dashboard_id = dashboard.id(),
            "provisioned dashboard saved"
        );

        self.update_alerting(&input, &dashboard).await?;

        Ok(dashboard)
    }

    /// Saves the folder a provisioning source places its dashboards in.
    ///
    /// The synthetic administrator keeps the default organization here, unlike
    /// [`Self::save_provisioned_dashboard`]; permission checks still receive `input.org_id`.
    pub async fn save_folder_for_provisioned_dashboards(
        &self,
        mut input: SaveDashboardInput,
    ) -> AppResult<Dashboard> {
        input.user = SignedInUser::provisioning_admin(OrgId::default());

        let command = self.command_builder.build(&mut input, false, false).await?;
        let dashboard = self.repository.save_dashboard(command).await?;

        self.update_alerting(&input, &dashboard).await?;

        Ok(dashboard)
    }

    /// Lists the provisioning links created by a provisioning source.
    pub async fn get_provisioned_dashboard_data(
        &self,
        name: &str,
    ) -> AppResult<Vec<ProvisioningRecord>> {
        self.repository.list_provisioned_dashboard_data(name).await
    }

    /// Returns the provisioning link of a dashboard, if any.
    pub async fn get_provisioned_dashboard_data_by_dashboard_id(
        &self,
        dashboard_id: i64,
    ) -> AppResult<Option<ProvisioningRecord>> {
        self.repository
            .find_provisioned_dashboard_data_by_dashboard_id(dashboard_id)
            .await
    }

    /// Forgets that a dashboard was provisioned; the dashboard itself stays.
    pub async fn unprovision_dashboard(&self, dashboard_id: i64) -> AppResult<()> {
        self.repository.unprovision_dashboard(dashboard_id).await
    }
}
