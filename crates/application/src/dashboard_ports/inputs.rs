use chrono::{DateTime, Utc};
use dashsync_core::{OrgId, SignedInUser};
use dashsync_domain::Dashboard;
use serde_json::Value;

/// Caller request to save one dashboard.
///
/// Owned by a single service call; the command builder normalizes `dashboard` in place.
#[derive(Debug, Clone)]
pub struct SaveDashboardInput {
    /// Organization the save happens in.
    pub org_id: OrgId,
    /// Explicit update timestamp, `None` lets persistence choose.
    pub updated_at: Option<DateTime<Utc>>,
    /// Acting user.
    pub user: SignedInUser,
    /// Commit message for the version history and the mirror.
    pub message: String,
    /// Whether to overwrite a concurrently changed dashboard.
    pub overwrite: bool,
    /// Dashboard to save.
    pub dashboard: Dashboard,
}

impl SaveDashboardInput {
    /// Creates a save request without message, overwrite or timestamp.
    #[must_use]
    pub fn new(org_id: OrgId, user: SignedInUser, dashboard: Dashboard) -> Self {
        Self {
            org_id,
            updated_at: None,
            user,
            message: String::new(),
            overwrite: false,
            dashboard,
        }
    }

    /// Sets the commit message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the overwrite flag.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets an explicit update timestamp.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }
}

/// Normalized persistence instruction produced by the command builder.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDashboardCommand {
    /// Dashboard JSON model.
    pub dashboard: Value,
    /// Commit message.
    pub message: String,
    /// Organization.
    pub org_id: OrgId,
    /// Overwrite flag.
    pub overwrite: bool,
    /// Acting user id, `0` for provisioning.
    pub user_id: i64,
    /// Parent folder id.
    pub folder_id: i64,
    /// Folder flag.
    pub is_folder: bool,
    /// Plugin id.
    pub plugin_id: String,
    /// Explicit update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SaveDashboardCommand {
    /// Rebuilds the dashboard the command describes.
    #[must_use]
    pub fn to_dashboard(&self) -> Dashboard {
        let dashboard = Dashboard::from_json(self.org_id, self.dashboard.clone())
            .with_folder_id(self.folder_id)
            .with_plugin_id(self.plugin_id.clone());

        if self.is_folder {
            dashboard.as_folder()
        } else {
            dashboard
        }
    }
}

/// Outcome of the persistence pre-validation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateDashboardBeforeSaveResult {
    /// The stored dashboard lives in a different folder than the incoming one.
    pub is_parent_folder_changed: bool,
}
