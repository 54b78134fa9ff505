use std::collections::HashMap;

use async_trait::async_trait;
use dashsync_application::{DashboardAlertSynchronizer, DashboardAlertValidator};
use dashsync_core::{AppError, AppResult, OrgId, SignedInUser};
use dashsync_domain::Dashboard;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Alert rule extracted from a dashboard panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardAlertRule {
    /// Organization owning the dashboard.
    pub org_id: OrgId,
    /// Dashboard carrying the panel.
    pub dashboard_id: i64,
    /// Panel carrying the alert.
    pub panel_id: i64,
    /// Alert name.
    pub name: String,
}

/// In-memory alert store validating and tracking panel alert rules.
#[derive(Debug, Default)]
pub struct InMemoryDashboardAlertStore {
    rules: RwLock<HashMap<(OrgId, i64), Vec<DashboardAlertRule>>>,
}

impl InMemoryDashboardAlertStore {
    /// Creates an empty alert store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rules currently tracked for a dashboard.
    pub async fn rules_for_dashboard(
        &self,
        org_id: OrgId,
        dashboard_id: i64,
    ) -> Vec<DashboardAlertRule> {
        self.rules
            .read()
            .await
            .get(&(org_id, dashboard_id))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DashboardAlertValidator for InMemoryDashboardAlertStore {
    async fn validate_dashboard_alerts(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        _user: &SignedInUser,
    ) -> AppResult<()> {
        extract_alert_rules(org_id, dashboard).map(|_| ())
    }
}

#[async_trait]
impl DashboardAlertSynchronizer for InMemoryDashboardAlertStore {
    async fn update_dashboard_alerts(
        &self,
        org_id: OrgId,
        dashboard: &Dashboard,
        user: &SignedInUser,
    ) -> AppResult<()> {
        let rules = extract_alert_rules(org_id, dashboard)?;
        debug!(
            dashboard_id = dashboard.id(),
            user_id = user.user_id(),
            alerts = rules.len(),
            "synchronizing dashboard alerts"
        );

        let mut stored = self.rules.write().await;
        if rules.is_empty() {
            stored.remove(&(org_id, dashboard.id()));
        } else {
            stored.insert((org_id, dashboard.id()), rules);
        }

        Ok(())
    }
}

fn extract_alert_rules(org_id: OrgId, dashboard: &Dashboard) -> AppResult<Vec<DashboardAlertRule>> {
    let data = dashboard.data();
    let nested_panels = data
        .get("rows")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|row| row.get("panels").and_then(Value::as_array))
        .flatten();
    let panels = data
        .get("panels")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .chain(nested_panels);

    let mut rules = Vec::new();
    for panel in panels {
        let Some(alert) = panel.get("alert") else {
            continue;
        };

        let panel_id = panel.get("id").and_then(Value::as_i64).ok_or_else(|| {
            AppError::Validation("alert validation error: panel id is required".to_owned())
        })?;
        let name = alert
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "alert validation error: panel {panel_id} alert requires a name"
                ))
            })?;
        let has_conditions = alert
            .get("conditions")
            .and_then(Value::as_array)
            .is_some_and(|conditions| !conditions.is_empty());
        if !has_conditions {
            return Err(AppError::Validation(format!(
                "alert validation error: alert '{name}' on panel {panel_id} has no conditions"
            )));
        }

        rules.push(DashboardAlertRule {
            org_id,
            dashboard_id: dashboard.id(),
            panel_id,
            name: name.to_owned(),
        });
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use dashsync_application::{DashboardAlertSynchronizer, DashboardAlertValidator};
    use dashsync_core::{AppError, OrgId, OrgRole, SignedInUser};
    use dashsync_domain::Dashboard;
    use serde_json::json;

    use super::InMemoryDashboardAlertStore;

    fn editor() -> SignedInUser {
        SignedInUser::new(3, OrgId::new(1), OrgRole::Editor, "editor")
    }

    #[tokio::test]
    async fn alert_without_conditions_is_rejected() {
        let store = InMemoryDashboardAlertStore::new();
        let dashboard = Dashboard::from_json(
            OrgId::new(1),
            json!({
                "title": "Alerts",
                "panels": [{ "id": 2, "alert": { "name": "High load", "conditions": [] } }]
            }),
        );

        let result = store
            .validate_dashboard_alerts(OrgId::new(1), &dashboard, &editor())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_tracks_rules_from_rows_and_panels() {
        let store = InMemoryDashboardAlertStore::new();
        let dashboard = Dashboard::from_json(
            OrgId::new(1),
            json!({
                "id": 7,
                "title": "Alerts",
                "panels": [{ "id": 1, "alert": { "name": "CPU", "conditions": [{}] } }],
                "rows": [{ "panels": [
                    { "id": 2 },
                    { "id": 3, "alert": { "name": "Disk", "conditions": [{}] } }
                ] }]
            }),
        );

        let result = store
            .update_dashboard_alerts(OrgId::new(1), &dashboard, &editor())
            .await;
        assert!(result.is_ok());

        let names: Vec<String> = store
            .rules_for_dashboard(OrgId::new(1), 7)
            .await
            .into_iter()
            .map(|rule| rule.name)
            .collect();
        assert_eq!(names, vec!["CPU".to_owned(), "Disk".to_owned()]);
    }
}
