use async_trait::async_trait;
use dashsync_core::{AppResult, OrgId, SignedInUser};
use dashsync_domain::Dashboard;

/// Port validating the alert rules embedded in a dashboard before it is saved.
#[async_trait]
pub trait DashboardAlertValidator: Send + Sync {
    /// Validates embedded alert rules.
    async fn validate_dashboard_alerts(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        user: &SignedInUser,
    ) -> AppResult<()>;
}

/// Port synchronizing alert rules with a persisted dashboard.
#[async_trait]
pub trait DashboardAlertSynchronizer: Send + Sync {
    /// Replaces the alert rules of the dashboard with the ones it now embeds.
    async fn update_dashboard_alerts(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        user: &SignedInUser,
    ) -> AppResult<()>;
}
