use std::sync::Arc;

use dashsync_core::{AppResult, OrgId, SignedInUser};
use dashsync_domain::DashboardError;

use crate::{
    DashboardAlertValidator, DashboardGuardian, DashboardRepository, SaveDashboardCommand,
    SaveDashboardInput,
};

/// Validates, authorizes and normalizes save requests into persistence commands.
#[derive(Clone)]
pub struct DashboardCommandBuilder {
    repository: Arc<dyn DashboardRepository>,
    alert_validator: Arc<dyn DashboardAlertValidator>,
    guardian: Arc<dyn DashboardGuardian>,
}

impl DashboardCommandBuilder {
    /// Creates a command builder.
    #[must_use]
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        alert_validator: Arc<dyn DashboardAlertValidator>,
        guardian: Arc<dyn DashboardGuardian>,
    ) -> Self {
        Self {
            repository,
            alert_validator,
            guardian,
        }
    }

    /// Builds the persistence command for a save request.
    ///
    /// Trims title and uid of `input.dashboard` in place, then stops at the first failing check:
    /// local invariants, embedded alerts, persistence pre-validation, folder move permission,
    /// provisioning ownership, and finally the save permission itself.
    pub async fn build(
        &self,
        input: &mut SaveDashboardInput,
        validate_alerts: bool,
        validate_provisioned_dashboard: bool,
    ) -> AppResult<SaveDashboardCommand> {
        input.dashboard.normalize();
        input.dashboard.validate()?;

        if validate_alerts {
            self.alert_validator
                .validate_dashboard_alerts(input.org_id, &input.dashboard, &input.user)
                .await?;
        }

        let before_save = self
            .repository
            .validate_dashboard_before_save(input.org_id, &input.dashboard, input.overwrite)
            .await?;

        if before_save.is_parent_folder_changed {
            self.ensure_can_save(input.dashboard.folder_id(), input.org_id, &input.user)
                .await?;
        }

        if validate_provisioned_dashboard
            && self
                .repository
                .find_provisioned_dashboard_data_by_dashboard_id(input.dashboard.id())
                .await?
                .is_some()
        {
            return Err(DashboardError::CannotSaveProvisioned.into());
        }

        self.ensure_can_save(
            input.dashboard.save_permission_target(),
            input.org_id,
            &input.user,
        )
        .await?;

        let dashboard = &input.dashboard;
        Ok(SaveDashboardCommand {
            dashboard: dashboard.data().clone(),
            message: input.message.clone(),
            org_id: input.org_id,
            overwrite: input.overwrite,
            user_id: input.user.user_id(),
            folder_id: dashboard.folder_id(),
            is_folder: dashboard.is_folder(),
            plugin_id: dashboard.plugin_id().to_owned(),
            updated_at: input.updated_at,
        })
    }

    async fn ensure_can_save(
        &self,
        dashboard_id: i64,
        org_id: OrgId,
        user: &SignedInUser,
    ) -> AppResult<()> {
        if self.guardian.can_save(dashboard_id, org_id, user).await? {
            Ok(())
        } else {
            Err(DashboardError::UpdateAccessDenied.into())
        }
    }
}
