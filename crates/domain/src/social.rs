use dashsync_core::OrgId;
use serde::{Deserialize, Serialize};

/// Identity provider tag stored next to externally authenticated users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityProvider {
    /// GitHub OAuth.
    Github,
    /// Google OAuth.
    Google,
    /// Twitter OAuth, kept so the numeric tags stay stable.
    Twitter,
    /// Generic OAuth2 provider.
    Generic,
    /// grafana.com OAuth.
    GrafanaCom,
    /// GitLab OAuth.
    Gitlab,
}

impl IdentityProvider {
    /// Numeric tag persisted with user auth records.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Github => 0,
            Self::Google => 1,
            Self::Twitter => 2,
            Self::Generic => 3,
            Self::GrafanaCom => 4,
            Self::Gitlab => 5,
        }
    }
}

/// File operation to mirror into the external repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardAction {
    /// Add a new file.
    Create,
    /// Replace an existing file.
    Update,
    /// Remove a file.
    Delete,
}

impl DashboardAction {
    /// Returns the action tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Everything a connector needs to mirror one dashboard change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDashboardOptions {
    /// File operation.
    pub action: DashboardAction,
    /// Commit message supplied by the user, only used for updates.
    pub message: String,
    /// Dashboard title.
    pub title: String,
    /// File name stem, the dashboard slug.
    pub name: String,
    /// Pretty-printed dashboard JSON.
    pub dashboard: String,
    /// Folder title the file is placed under.
    pub folder: String,
    /// Organization owning the dashboard.
    pub org_id: OrgId,
}

impl UpdateDashboardOptions {
    /// Builds the commit message for the action.
    #[must_use]
    pub fn commit_message(&self) -> String {
        match self.action {
            DashboardAction::Create => format!("Create {} dashboard", self.title),
            DashboardAction::Delete => format!("Delete {} dashboard", self.title),
            DashboardAction::Update => {
                format!("Update {} dashboard\n\n{}", self.title, self.message)
            }
        }
    }

    /// Repository path `{base}/{folder}/{name}.json`, cleaned like a `/`-separated path join.
    ///
    /// Empty and `.` segments are dropped and `..` removes the preceding segment; on a rooted
    /// path a leading `..` is discarded.
    #[must_use]
    pub fn file_path(&self, base: &str) -> String {
        let rooted = base.starts_with('/');
        let file_name = format!("{}.json", self.name);
        let mut segments: Vec<&str> = Vec::new();

        for segment in [base, self.folder.as_str(), file_name.as_str()]
            .into_iter()
            .flat_map(|part| part.split('/'))
        {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    _ if rooted => {}
                    _ => segments.push(".."),
                },
                segment => segments.push(segment),
            }
        }

        let joined = segments.join("/");
        if rooted {
            format!("/{joined}")
        } else {
            joined
        }
    }
}

/// Normalized profile returned by every identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUserInfo {
    /// Provider-side user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Login name.
    pub login: String,
    /// Company, when the provider reports one.
    pub company: String,
    /// Organization role suggested by the provider.
    pub role: String,
    /// Group paths the user belongs to.
    pub groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use dashsync_core::OrgId;

    use super::{DashboardAction, UpdateDashboardOptions};

    fn options(action: DashboardAction) -> UpdateDashboardOptions {
        UpdateDashboardOptions {
            action,
            message: "tweak thresholds".to_owned(),
            title: "Latency".to_owned(),
            name: "latency".to_owned(),
            dashboard: "{}".to_owned(),
            folder: "Ops".to_owned(),
            org_id: OrgId::new(1),
        }
    }

    #[test]
    fn commit_message_depends_on_action() {
        assert_eq!(
            options(DashboardAction::Create).commit_message(),
            "Create Latency dashboard"
        );
        assert_eq!(
            options(DashboardAction::Delete).commit_message(),
            "Delete Latency dashboard"
        );
        assert_eq!(
            options(DashboardAction::Update).commit_message(),
            "Update Latency dashboard\n\ntweak thresholds"
        );
    }

    #[test]
    fn file_path_joins_base_folder_and_slug() {
        let options = options(DashboardAction::Create);
        assert_eq!(options.file_path("dashboards"), "dashboards/Ops/latency.json");
        assert_eq!(options.file_path(""), "Ops/latency.json");
        assert_eq!(options.file_path("grafana/"), "grafana/Ops/latency.json");
    }

    #[test]
    fn file_path_resolves_parent_segments() {
        let mut options = options(DashboardAction::Create);
        options.folder = "..".to_owned();
        assert_eq!(options.file_path("dashboards"), "latency.json");
        assert_eq!(options.file_path("grafana/dashboards"), "grafana/latency.json");
        assert_eq!(options.file_path(""), "../latency.json");
        assert_eq!(options.file_path("/"), "/latency.json");

        options.folder = "Ops/../Infra".to_owned();
        assert_eq!(options.file_path("dashboards"), "dashboards/Infra/latency.json");
    }
}
