use dashsync_core::{AppError, AppResult, SignedInUser};
use dashsync_domain::{
    Dashboard, DashboardAction, DashboardError, GENERAL_FOLDER_NAME, UpdateDashboardOptions,
};
use tracing::{debug, warn};

use super::DashboardService;
use crate::SaveDashboardInput;

const UNKNOWN_FOLDER_NAME: &str = "unknown";

impl DashboardService {
    /// Mirrors a user save, diffing against the stored version.
    ///
    /// A folder move is two separate commits, a delete at the old path then a create at the new
    /// one. They are not atomic: if the create fails the old file is already gone.
    pub(super) async fn mirror_saved_dashboard(
        &self,
        input: &SaveDashboardInput,
        token: &str,
    ) -> AppResult<()> {
        let dashboard = &input.dashboard;

        match self.previous_dashboard(dashboard).await {
            Some(previous) if previous.folder_id() != dashboard.folder_id() => {
                self.mirror_dashboard(&previous, DashboardAction::Delete, &input.user, token, "")
                    .await?;
                self.mirror_dashboard(dashboard, DashboardAction::Create, &input.user, token, "")
                    .await
            }
            Some(_) => {
                self.mirror_dashboard(
                    dashboard,
                    DashboardAction::Update,
                    &input.user,
                    token,
                    &input.message,
                )
                .await
            }
            None => {
                self.mirror_dashboard(dashboard, DashboardAction::Create, &input.user, token, "")
                    .await
            }
        }
    }

    /// Sends one file action to the connector the user signed in with.
    pub(super) async fn mirror_dashboard(
        &self,
        dashboard: &Dashboard,
        action: DashboardAction,
        user: &SignedInUser,
        token: &str,
        message: &str,
    ) -> AppResult<()> {
        let Some(connector) = user
            .auth_module()
            .and_then(|auth_module| self.social_connectors.get(auth_module))
        else {
            warn!(
                auth_module = user.auth_module().unwrap_or_default(),
                "no connector registered for the user's auth module"
            );
            return Err(DashboardError::ExternalSyncFailed.into());
        };

        let content = serde_json::to_string_pretty(dashboard.data()).map_err(|error| {
            AppError::Internal(format!("failed to serialize dashboard model: {error}"))
        })?;

        let options = UpdateDashboardOptions {
            action,
            message: message.to_owned(),
            title: dashboard.title().to_owned(),
            name: dashboard.slug().to_owned(),
            dashboard: content,
            folder: self.dashboard_folder_name(dashboard).await,
            org_id: dashboard.org_id(),
        };

        debug!(
            org_id = %options.org_id,
            action = action.as_str(),
            folder = options.folder.as_str(),
            name = options.name.as_str(),
            "mirroring dashboard change"
        );

        connector.update_dashboard(&options, token).await
    }

    /// Stored version of the dashboard; version `0` means new and is never looked up.
    async fn previous_dashboard(&self, dashboard: &Dashboard) -> Option<Dashboard> {
        if dashboard.version() == 0 {
            return None;
        }

        match self.repository.find_dashboard_by_id(dashboard.id()).await {
            Ok(previous) => previous,
            Err(error) => {
                debug!(dashboard_id = dashboard.id(), %error, "previous dashboard lookup failed");
                None
            }
        }
    }

    async fn dashboard_folder_name(&self, dashboard: &Dashboard) -> String {
        if dashboard.folder_id() == 0 {
            return GENERAL_FOLDER_NAME.to_owned();
        }

        match self.repository.find_dashboard_by_id(dashboard.folder_id()).await {
            Ok(Some(folder)) => folder.title().to_owned(),
            _ => UNKNOWN_FOLDER_NAME.to_owned(),
        }
    }
}
