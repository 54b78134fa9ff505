use std::sync::Arc;

use dashsync_core::{AppError, AppResult, OrgId};
use dashsync_domain::{Dashboard, DashboardAction, DashboardError};
use tracing::{info, warn};

use crate::{
    DashboardAlertSynchronizer, DashboardAlertValidator, DashboardGuardian, DashboardRepository,
    SaveDashboardInput, SocialConnectorRegistry,
};

mod command;
mod mirror;
mod provisioning;

pub use command::DashboardCommandBuilder;

/// Application service saving, importing and deleting dashboards.
///
/// Every flow runs strictly in sequence: build and authorize the command, mirror the change to the
/// user's external repository when applicable, persist, then synchronize alert rules. A failure
/// after persistence is returned to the caller but does not undo the write.
#[derive(Clone)]
pub struct DashboardService {
    command_builder: DashboardCommandBuilder,
    repository: Arc<dyn DashboardRepository>,
    alert_synchronizer: Arc<dyn DashboardAlertSynchronizer>,
    social_connectors: Arc<SocialConnectorRegistry>,
}

impl DashboardService {
    /// Creates a new dashboard service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        alert_validator: Arc<dyn DashboardAlertValidator>,
        alert_synchronizer: Arc<dyn DashboardAlertSynchronizer>,
        guardian: Arc<dyn DashboardGuardian>,
        social_connectors: Arc<SocialConnectorRegistry>,
    ) -> Self {
        Self {
            command_builder: DashboardCommandBuilder::new(
                repository.clone(),
                alert_validator,
                guardian,
            ),
            repository,
            alert_synchronizer,
            social_connectors,
        }
    }

    /// Returns the command builder used by every save flow.
    #[must_use]
    pub fn command_builder(&self) -> &DashboardCommandBuilder {
        &self.command_builder
    }

    /// Saves a dashboard on behalf of a user.
    ///
    /// Users signed in through an OAuth provider get the change mirrored first; a mirror failure
    /// aborts the save before anything is persisted.
    pub async fn save_dashboard(&self, mut input: SaveDashboardInput) -> AppResult<Dashboard> {
        let command = self.command_builder.build(&mut input, true, true).await?;

        if let Some(token) = input.user.external_token() {
            self.mirror_saved_dashboard(&input, token).await?;
        }

        let dashboard = self.repository.save_dashboard(command).await?;
        info!(
            org_id = %input.org_id,
            dashboard_id = dashboard.id(),
            version = dashboard.version(),
            "dashboard saved"
        );

        self.update_alerting(&input, &dashboard).await?;

        Ok(dashboard)
    }

    /// Imports a dashboard; the user must hold an external identity to mirror it.
    pub async fn import_dashboard(&self, mut input: SaveDashboardInput) -> AppResult<Dashboard> {
        let command = self.command_builder.build(&mut input, false, true).await?;

        let Some(token) = input.user.external_token() else {
            warn!(
                org_id = %input.org_id,
                user_id = input.user.user_id(),
                "dashboard import refused without external identity"
            );
            return Err(DashboardError::ExternalSyncRequired.into());
        };

        self.mirror_dashboard(
            &input.dashboard,
            DashboardAction::Create,
            &input.user,
            token,
            &input.message,
        )
        .await?;

        let dashboard = self.repository.save_dashboard(command).await?;
        info!(org_id = %input.org_id, dashboard_id = dashboard.id(), "dashboard imported");

        Ok(dashboard)
    }

    /// Deletes a dashboard unless it is owned by provisioning.
    pub async fn delete_dashboard(&self, dashboard_id: i64, org_id: OrgId) -> AppResult<()> {
        self.delete(dashboard_id, org_id, true).await
    }

    /// Deletes a dashboard even when it is owned by provisioning.
    pub async fn delete_provisioned_dashboard(
        &self,
        dashboard_id: i64,
        org_id: OrgId,
    ) -> AppResult<()> {
        self.delete(dashboard_id, org_id, false).await
    }

    async fn delete(
        &self,
        dashboard_id: i64,
        org_id: OrgId,
        validate_provisioned_dashboard: bool,
    ) -> AppResult<()> {
        if validate_provisioned_dashboard {
            let provisioned = self
                .repository
                .find_provisioned_dashboard_data_by_dashboard_id(dashboard_id)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to check if dashboard is provisioned: {error}"
                    ))
                })?;

            if provisioned.is_some() {
                return Err(DashboardError::CannotDeleteProvisioned.into());
            }
        }

        self.repository.delete_dashboard(org_id, dashboard_id).await?;
        info!(%org_id, dashboard_id, "dashboard deleted");

        Ok(())
    }

    async fn update_alerting(
        &self,
        input: &SaveDashboardInput,
        dashboard: &Dashboard,
    ) -> AppResult<()> {
        self.alert_synchronizer
            .update_dashboard_alerts(input.org_id, dashboard, &input.user)
            .await
    }
}
