use std::collections::HashMap;

use async_trait::async_trait;
use dashsync_application::DashboardGuardian;
use dashsync_core::{AppResult, OrgId, OrgRole, SignedInUser};
use tokio::sync::RwLock;

/// Guardian granting save rights by organization role with per-dashboard overrides.
///
/// Editors and admins may save anywhere, viewers nowhere, unless an explicit override exists for
/// the user on the addressed dashboard or folder.
#[derive(Debug, Default)]
pub struct OrgRoleDashboardGuardian {
    overrides: RwLock<HashMap<(OrgId, i64, i64), bool>>,
}

impl OrgRoleDashboardGuardian {
    /// Creates a guardian without overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants or revokes save rights for one user on one dashboard or folder.
    pub async fn set_override(
        &self,
        org_id: OrgId,
        dashboard_id: i64,
        user_id: i64,
        can_save: bool,
    ) {
        self.overrides
            .write()
            .await
            .insert((org_id, dashboard_id, user_id), can_save);
    }
}

#[async_trait]
impl DashboardGuardian for OrgRoleDashboardGuardian {
    async fn can_save(
        &self,
        dashboard_id: i64,
        org_id: OrgId,
        user: &SignedInUser,
    ) -> AppResult<bool> {
        if let Some(can_save) = self
            .overrides
            .read()
            .await
            .get(&(org_id, dashboard_id, user.user_id()))
        {
            return Ok(*can_save);
        }

        Ok(matches!(user.org_role(), OrgRole::Editor | OrgRole::Admin))
    }
}

#[cfg(test)]
mod tests {
    use dashsync_application::DashboardGuardian;
    use dashsync_core::{OrgId, OrgRole, SignedInUser};

    use super::OrgRoleDashboardGuardian;

    #[tokio::test]
    async fn role_decides_without_override() {
        let guardian = OrgRoleDashboardGuardian::new();
        let viewer = SignedInUser::new(1, OrgId::new(1), OrgRole::Viewer, "viewer");
        let editor = SignedInUser::new(2, OrgId::new(1), OrgRole::Editor, "editor");

        assert!(matches!(guardian.can_save(0, OrgId::new(1), &viewer).await, Ok(false)));
        assert!(matches!(guardian.can_save(0, OrgId::new(1), &editor).await, Ok(true)));
    }

    #[tokio::test]
    async fn override_wins_over_role() {
        let guardian = OrgRoleDashboardGuardian::new();
        let editor = SignedInUser::new(2, OrgId::new(1), OrgRole::Editor, "editor");
        guardian.set_override(OrgId::new(1), 9, 2, false).await;

        assert!(matches!(guardian.can_save(9, OrgId::new(1), &editor).await, Ok(false)));
        assert!(matches!(guardian.can_save(8, OrgId::new(1), &editor).await, Ok(true)));
    }
}
