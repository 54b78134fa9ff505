use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use dashsync_application::{
    DashboardRepository, SaveDashboardCommand, ValidateDashboardBeforeSaveResult,
};
use dashsync_core::{AppResult, OrgId};
use dashsync_domain::{Dashboard, DashboardError, ProvisioningRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

const SHORT_UID_LENGTH: usize = 9;

#[derive(Debug, Default)]
struct DashboardStore {
    dashboards: HashMap<i64, Dashboard>,
    provisioning: HashMap<i64, ProvisioningRecord>,
    last_dashboard_id: i64,
    last_provisioning_id: i64,
}

impl DashboardStore {
    fn find_in_org(&self, org_id: OrgId, dashboard_id: i64) -> Option<&Dashboard> {
        self.dashboards
            .get(&dashboard_id)
            .filter(|dashboard| dashboard.org_id() == org_id)
    }

    fn find_by_uid(&self, org_id: OrgId, uid: &str) -> Option<&Dashboard> {
        if uid.is_empty() {
            return None;
        }

        self.dashboards
            .values()
            .find(|dashboard| dashboard.org_id() == org_id && dashboard.uid() == uid)
    }

    fn find_by_title_in_folder(&self, org_id: OrgId, candidate: &Dashboard) -> Option<&Dashboard> {
        self.dashboards.values().find(|dashboard| {
            dashboard.org_id() == org_id
                && dashboard.folder_id() == candidate.folder_id()
                && dashboard.slug() == candidate.slug()
                && dashboard.id() != candidate.id()
        })
    }

    fn validate(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        overwrite: bool,
    ) -> AppResult<ValidateDashboardBeforeSaveResult> {
        let mut result = ValidateDashboardBeforeSaveResult::default();

        if dashboard.folder_id() > 0
            && !self
                .find_in_org(org_id, dashboard.folder_id())
                .is_some_and(Dashboard::is_folder)
        {
            return Err(DashboardError::FolderNotFound.into());
        }

        if dashboard.id() > 0 {
            let existing = self
                .find_in_org(org_id, dashboard.id())
                .ok_or(DashboardError::NotFound)?;

            if existing.is_folder() != dashboard.is_folder() {
                return Err(DashboardError::TypeMismatch.into());
            }

            if !overwrite && existing.version() != dashboard.version() {
                return Err(DashboardError::VersionMismatch.into());
            }

            result.is_parent_folder_changed = existing.folder_id() != dashboard.folder_id();
        }

        if let Some(same_uid) = self.find_by_uid(org_id, dashboard.uid())
            && same_uid.id() != dashboard.id()
            && (dashboard.id() != 0 || !overwrite)
        {
            return Err(DashboardError::WithSameUidExists.into());
        }

        if let Some(same_title) = self.find_by_title_in_folder(org_id, dashboard) {
            if same_title.is_folder() != dashboard.is_folder() {
                return Err(DashboardError::TypeMismatch.into());
            }
            if !overwrite {
                return Err(DashboardError::WithSameNameInFolderExists.into());
            }
        }

        Ok(result)
    }

    fn save(&mut self, command: SaveDashboardCommand) -> AppResult<Dashboard> {
        let mut dashboard = command.to_dashboard();

        if dashboard.id() == 0 && command.overwrite {
            let adopted = self
                .find_by_uid(command.org_id, dashboard.uid())
                .or_else(|| self.find_by_title_in_folder(command.org_id, &dashboard))
                .map(|existing| (existing.id(), existing.version()));
            if let Some((id, version)) = adopted {
                dashboard.set_id(id);
                dashboard.set_version(version);
            }
        }

        let version = if dashboard.id() == 0 {
            self.last_dashboard_id += 1;
            dashboard.set_id(self.last_dashboard_id);
            1
        } else {
            let existing = self
                .find_in_org(command.org_id, dashboard.id())
                .ok_or(DashboardError::NotFound)?;
            if !command.overwrite && existing.version() != dashboard.version() {
                return Err(DashboardError::VersionMismatch.into());
            }
            existing.version() + 1
        };

        dashboard.set_version(version);
        if dashboard.uid().is_empty() {
            dashboard.set_uid(generate_short_uid());
        }
        dashboard.set_updated(command.updated_at.unwrap_or_else(Utc::now));

        self.dashboards.insert(dashboard.id(), dashboard.clone());
        Ok(dashboard)
    }

    fn link_provisioning(&mut self, dashboard_id: i64, mut provisioning: ProvisioningRecord) {
        provisioning.dashboard_id = dashboard_id;
        provisioning.id = match self.provisioning.get(&dashboard_id) {
            Some(existing) => existing.id,
            None => {
                self.last_provisioning_id += 1;
                self.last_provisioning_id
            }
        };
        self.provisioning.insert(dashboard_id, provisioning);
    }
}

/// In-memory dashboard store honoring the persistence pre-validation rules.
#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    store: RwLock<DashboardStore>,
}

impl InMemoryDashboardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn save_dashboard(&self, command: SaveDashboardCommand) -> AppResult<Dashboard> {
        self.store.write().await.save(command)
    }

    async fn save_provisioned_dashboard(
        &self,
        command: SaveDashboardCommand,
        provisioning: ProvisioningRecord,
    ) -> AppResult<Dashboard> {
        let mut store = self.store.write().await;
        let dashboard = store.save(command)?;
        store.link_provisioning(dashboard.id(), provisioning);

        Ok(dashboard)
    }

    async fn delete_dashboard(&self, org_id: OrgId, dashboard_id: i64) -> AppResult<()> {
        let mut store = self.store.write().await;
        let dashboard = store
            .find_in_org(org_id, dashboard_id)
            .cloned()
            .ok_or(DashboardError::NotFound)?;

        let mut removed = vec![dashboard_id];
        if dashboard.is_folder() {
            removed.extend(
                store
                    .dashboards
                    .values()
                    .filter(|child| child.folder_id() == dashboard_id)
                    .map(Dashboard::id),
            );
        }

        for id in removed {
            store.dashboards.remove(&id);
            store.provisioning.remove(&id);
        }

        Ok(())
    }

    async fn find_dashboard_by_id(&self, dashboard_id: i64) -> AppResult<Option<Dashboard>> {
        Ok(self.store.read().await.dashboards.get(&dashboard_id).cloned())
    }

    async fn list_provisioned_dashboard_data(
        &self,
        name: &str,
    ) -> AppResult<Vec<ProvisioningRecord>> {
        let store = self.store.read().await;
        let mut records: Vec<ProvisioningRecord> = store
            .provisioning
            .values()
            .filter(|record| record.name == name)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id);

        Ok(records)
    }

    async fn find_provisioned_dashboard_data_by_dashboard_id(
        &self,
        dashboard_id: i64,
    ) -> AppResult<Option<ProvisioningRecord>> {
        Ok(self
            .store
            .read()
            .await
            .provisioning
            .get(&dashboard_id)
            .cloned())
    }

    async fn unprovision_dashboard(&self, dashboard_id: i64) -> AppResult<()> {
        self.store.write().await.provisioning.remove(&dashboard_id);
        Ok(())
    }

    async fn validate_dashboard_before_save(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        overwrite: bool,
    ) -> AppResult<ValidateDashboardBeforeSaveResult> {
        self.store.read().await.validate(org_id, dashboard, overwrite)
    }
}

fn generate_short_uid() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SHORT_UID_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests;
