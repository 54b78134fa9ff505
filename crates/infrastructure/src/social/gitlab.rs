use async_trait::async_trait;
use dashsync_application::{OAuthToken, SocialConnector, is_email_allowed};
use dashsync_core::{AppError, AppResult, OrgId};
use dashsync_domain::{BasicUserInfo, DashboardError, IdentityProvider, UpdateDashboardOptions};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::base::SocialBase;
use super::http::http_get;
use super::settings::{OAuthProviderSettings, RepoMapping};

const API_VERSION_PATH: &str = "api/v4";

#[derive(Debug, Deserialize)]
struct GitlabUser {
    id: i64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct GitlabGroup {
    full_path: String,
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    branch: &'a str,
    commit_message: String,
    actions: [CommitAction<'a>; 1],
}

#[derive(Debug, Serialize)]
struct CommitAction<'a> {
    action: &'static str,
    file_path: String,
    content: &'a str,
}

/// GitLab identity provider that also mirrors dashboards into per-organization repositories.
#[derive(Debug, Clone)]
pub struct SocialGitlab {
    base: SocialBase,
    allowed_domains: Vec<String>,
    allowed_groups: Vec<String>,
    api_url: String,
    allow_sign_up: bool,
    repos: Vec<RepoMapping>,
}

impl SocialGitlab {
    /// Creates the connector from its settings.
    #[must_use]
    pub fn new(base: SocialBase, settings: &OAuthProviderSettings) -> Self {
        Self {
            base,
            allowed_domains: settings.allowed_domains.clone(),
            allowed_groups: settings.allowed_groups.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_owned(),
            allow_sign_up: settings.allow_sign_up,
            repos: settings.repos.clone(),
        }
    }

    /// Returns the first repository mapped to the organization.
    #[must_use]
    pub fn repo(&self, org_id: OrgId) -> Option<&RepoMapping> {
        self.repos.iter().find(|repo| repo.org_id == org_id)
    }

    /// Returns whether one of the groups is allowed; an empty allow-list admits everyone.
    #[must_use]
    pub fn is_group_member(&self, groups: &[String]) -> bool {
        self.allowed_groups.is_empty()
            || self
                .allowed_groups
                .iter()
                .any(|allowed| groups.contains(allowed))
    }

    /// Collects the full paths of every group of the token owner across all pages.
    ///
    /// A page that fails to load or decode ends the listing with what was gathered so far.
    pub async fn groups(&self, token: &str) -> Vec<String> {
        let mut groups = Vec::new();
        let mut next = Some(format!("{}/groups", self.api_url));

        while let Some(url) = next.take() {
            let Some((page, next_url)) = self.groups_page(token, &url).await else {
                break;
            };
            groups.extend(page);
            next = next_url;
        }

        groups
    }

    /// Fetches one page of groups and the `rel="next"` link, if any.
    pub async fn groups_page(
        &self,
        token: &str,
        url: &str,
    ) -> Option<(Vec<String>, Option<String>)> {
        if url.is_empty() {
            return None;
        }

        let response = match http_get(self.base.client(token), url).await {
            Ok(response) => response,
            Err(error) => {
                error!(url, error = %error, "failed to get groups from the GitLab API");
                return None;
            }
        };

        let groups = match response.json::<Vec<GitlabGroup>>(url) {
            Ok(groups) => groups,
            Err(error) => {
                error!(url, error = %error, "failed to parse groups from the GitLab API");
                return None;
            }
        };

        Some((
            groups.into_iter().map(|group| group.full_path).collect(),
            response.next_page(),
        ))
    }

    async fn create_commit(
        &self,
        repo: &RepoMapping,
        options: &UpdateDashboardOptions,
        token: &str,
    ) -> Result<(), String> {
        let commit = CreateCommitRequest {
            branch: &repo.branch,
            commit_message: options.commit_message(),
            actions: [CommitAction {
                action: options.action.as_str(),
                file_path: options.file_path(&repo.dashboards_path),
                content: &options.dashboard,
            }],
        };
        let url = format!(
            "{}/projects/{}/repository/commits",
            api_base_url(&repo.url),
            repo.repo_id
        );

        let response = self
            .base
            .client(token)
            .post(&url)
            .json(&commit)
            .send()
            .await
            .map_err(|error| format!("POST {url} failed: {error}"))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(format!("POST {url} returned status {status}: {body}"))
    }
}

#[async_trait]
impl SocialConnector for SocialGitlab {
    fn provider_type(&self) -> IdentityProvider {
        IdentityProvider::Gitlab
    }

    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo> {
        let url = format!("{}/user", self.api_url);
        let user = http_get(self.base.client(&token.access_token), &url)
            .await
            .and_then(|response| response.json::<GitlabUser>(&url))
            .map_err(|error| AppError::Unauthorized(format!("error getting user info: {error}")))?;

        if user.state != "active" {
            warn!(login = %user.username, state = %user.state, "rejecting inactive GitLab user");
            return Err(AppError::IdentityRejected(format!(
                "user {} is inactive",
                user.username
            )));
        }

        let groups = self.groups(&token.access_token).await;
        if !self.is_group_member(&groups) {
            warn!(login = %user.username, "GitLab user is not a member of an allowed group");
            return Err(DashboardError::MissingGroupMembership.into());
        }

        Ok(BasicUserInfo {
            id: user.id.to_string(),
            name: user.name,
            email: user.email.unwrap_or_default(),
            login: user.username,
            groups,
            ..BasicUserInfo::default()
        })
    }

    fn is_email_allowed(&self, email: &str) -> bool {
        is_email_allowed(email, &self.allowed_domains)
    }

    fn is_signup_allowed(&self) -> bool {
        self.allow_sign_up
    }

    async fn update_dashboard(
        &self,
        options: &UpdateDashboardOptions,
        token: &str,
    ) -> AppResult<()> {
        let Some(repo) = self.repo(options.org_id) else {
            warn!(org_id = %options.org_id, "no GitLab repository mapped for organization");
            return Err(DashboardError::ExternalSyncFailed.into());
        };

        match self.create_commit(repo, options, token).await {
            Ok(()) => {
                info!(
                    org_id = %options.org_id,
                    repo_id = repo.repo_id,
                    action = options.action.as_str(),
                    "mirrored dashboard to GitLab"
                );
                Ok(())
            }
            Err(cause) => {
                error!(
                    org_id = %options.org_id,
                    repo_id = repo.repo_id,
                    error = %cause,
                    "GitLab commit failed"
                );
                Err(DashboardError::ExternalSyncFailed.into())
            }
        }
    }

    fn auth_code_url(&self, state: &str) -> String {
        self.base.auth_code_url(state, &[])
    }

    async fn exchange(&self, code: &str) -> AppResult<OAuthToken> {
        self.base.exchange(code).await
    }
}

/// Appends the `api/v4` suffix the commits API lives under when the base URL lacks it.
fn api_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with(API_VERSION_PATH) {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/{API_VERSION_PATH}")
    }
}

#[cfg(test)]
mod tests;
