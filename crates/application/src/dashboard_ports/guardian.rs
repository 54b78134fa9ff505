use async_trait::async_trait;
use dashsync_core::{AppResult, OrgId, SignedInUser};

/// Capability guardian answering save permission checks.
#[async_trait]
pub trait DashboardGuardian: Send + Sync {
    /// Returns whether the user may save the dashboard or folder `dashboard_id`.
    ///
    /// `0` addresses the root folder.
    async fn can_save(
        &self,
        dashboard_id: i64,
        org_id: OrgId,
        user: &SignedInUser,
    ) -> AppResult<bool>;
}
