use async_trait::async_trait;
use dashsync_application::{OAuthToken, SocialConnector};
use dashsync_core::{AppError, AppResult};
use dashsync_domain::{BasicUserInfo, DashboardError, IdentityProvider};
use serde::Deserialize;
use tracing::warn;

use super::base::SocialBase;
use super::github::OrganizationLogin;
use super::http::http_get;
use super::settings::OAuthProviderSettings;

#[derive(Debug, Deserialize)]
struct GrafanaComUser {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    login: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    orgs: Vec<OrganizationLogin>,
}

/// grafana.com identity provider with an organization allow-list.
#[derive(Debug, Clone)]
pub struct SocialGrafanaCom {
    base: SocialBase,
    url: String,
    allow_sign_up: bool,
    allowed_organizations: Vec<String>,
}

impl SocialGrafanaCom {
    /// Creates the connector for the grafana.com instance at `url`.
    #[must_use]
    pub fn new(base: SocialBase, url: &str, settings: &OAuthProviderSettings) -> Self {
        Self {
            base,
            url: url.trim_end_matches('/').to_owned(),
            allow_sign_up: settings.allow_sign_up,
            allowed_organizations: settings.allowed_organizations.clone(),
        }
    }
}

#[async_trait]
impl SocialConnector for SocialGrafanaCom {
    fn provider_type(&self) -> IdentityProvider {
        IdentityProvider::GrafanaCom
    }

    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo> {
        let url = format!("{}/api/oauth2/user", self.url);
        let user: GrafanaComUser = http_get(self.base.client(&token.access_token), &url)
            .await
            .and_then(|response| response.json(&url))
            .map_err(|error| AppError::Unauthorized(format!("error getting user info: {error}")))?;

        let is_member = self.allowed_organizations.is_empty()
            || user
                .orgs
                .iter()
                .any(|org| self.allowed_organizations.contains(&org.login));
        if !is_member {
            warn!(
                login = %user.login,
                "grafana.com user is not a member of an allowed organization"
            );
            return Err(DashboardError::MissingOrganizationMembership.into());
        }

        Ok(BasicUserInfo {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            login: user.login,
            role: user.role,
            ..BasicUserInfo::default()
        })
    }

    fn is_email_allowed(&self, _email: &str) -> bool {
        true
    }

    fn is_signup_allowed(&self) -> bool {
        self.allow_sign_up
    }

    fn auth_code_url(&self, state: &str) -> String {
        self.base.auth_code_url(state, &[])
    }

    async fn exchange(&self, code: &str) -> AppResult<OAuthToken> {
        self.base.exchange(code).await
    }
}
