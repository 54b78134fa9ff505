use async_trait::async_trait;
use dashsync_application::{OAuthToken, SocialConnector, is_email_allowed};
use dashsync_core::{AppError, AppResult};
use dashsync_domain::{BasicUserInfo, DashboardError, IdentityProvider};
use serde::Deserialize;
use tracing::warn;

use super::base::SocialBase;
use super::http::{get_all_pages, http_get};
use super::settings::OAuthProviderSettings;

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Deserialize)]
struct GithubTeam {
    id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganizationLogin {
    pub(crate) login: String,
}

/// GitHub identity provider with team and organization allow-lists.
#[derive(Debug, Clone)]
pub struct SocialGithub {
    base: SocialBase,
    allowed_domains: Vec<String>,
    api_url: String,
    allow_sign_up: bool,
    team_ids: Vec<i64>,
    allowed_organizations: Vec<String>,
}

impl SocialGithub {
    /// Creates the connector from its settings.
    #[must_use]
    pub fn new(base: SocialBase, settings: &OAuthProviderSettings) -> Self {
        Self {
            base,
            allowed_domains: settings.allowed_domains.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_owned(),
            allow_sign_up: settings.allow_sign_up,
            team_ids: settings.team_ids.clone(),
            allowed_organizations: settings.allowed_organizations.clone(),
        }
    }

    async fn is_team_member(&self, token: &str) -> AppResult<bool> {
        if self.team_ids.is_empty() {
            return Ok(true);
        }

        let teams: Vec<GithubTeam> =
            get_all_pages(self.base.client(token), &format!("{}/teams", self.api_url))
                .await?;

        Ok(teams.iter().any(|team| self.team_ids.contains(&team.id)))
    }

    async fn is_organization_member(&self, token: &str) -> AppResult<bool> {
        if self.allowed_organizations.is_empty() {
            return Ok(true);
        }

        let organizations: Vec<OrganizationLogin> =
            get_all_pages(self.base.client(token), &format!("{}/orgs", self.api_url))
                .await?;

        Ok(organizations
            .iter()
            .any(|organization| self.allowed_organizations.contains(&organization.login)))
    }

    async fn primary_email(&self, token: &str) -> AppResult<String> {
        let url = format!("{}/emails", self.api_url);
        let emails: Vec<GithubEmail> = http_get(self.base.client(token), &url)
            .await?
            .json(&url)?;

        emails
            .into_iter()
            .find(|email| email.primary)
            .map(|email| email.email)
            .ok_or_else(|| AppError::Unauthorized("github user has no primary email".to_owned()))
    }
}

#[async_trait]
impl SocialConnector for SocialGithub {
    fn provider_type(&self) -> IdentityProvider {
        IdentityProvider::Github
    }

    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo> {
        let access_token = token.access_token.as_str();
        let user: GithubUser = http_get(self.base.client(access_token), &self.api_url)
            .await
            .and_then(|response| response.json(&self.api_url))
            .map_err(|error| AppError::Unauthorized(format!("error getting user info: {error}")))?;

        if !self.is_team_member(access_token).await? {
            warn!(login = %user.login, "GitHub user is not a member of an allowed team");
            return Err(DashboardError::MissingTeamMembership.into());
        }

        if !self.is_organization_member(access_token).await? {
            warn!(login = %user.login, "GitHub user is not a member of an allowed organization");
            return Err(DashboardError::MissingOrganizationMembership.into());
        }

        let email = match user.email.filter(|email| !email.is_empty()) {
            Some(email) => email,
            None => self.primary_email(access_token).await?,
        };

        Ok(BasicUserInfo {
            id: user.id.to_string(),
            name: user.name.unwrap_or_else(|| user.login.clone()),
            email,
            login: user.login,
            company: user.company.unwrap_or_default(),
            ..BasicUserInfo::default()
        })
    }

    fn is_email_allowed(&self, email: &str) -> bool {
        is_email_allowed(email, &self.allowed_domains)
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
