use async_trait::async_trait;
use dashsync_application::{OAuthToken, SocialConnector, is_email_allowed};
use dashsync_core::{AppError, AppResult};
use dashsync_domain::{BasicUserInfo, DashboardError, IdentityProvider};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::base::SocialBase;
use super::github::OrganizationLogin;
use super::http::{get_all_pages, http_get};
use super::settings::OAuthProviderSettings;

const DEFAULT_EMAIL_ATTRIBUTE: &str = "email";

#[derive(Debug, Deserialize)]
struct GenericEmail {
    email: String,
    #[serde(default)]
    primary: bool,
}

#[derive(Debug, Deserialize)]
struct GenericTeam {
    id: i64,
}

/// OAuth2 provider exposing a GitHub-like user API with a configurable email attribute.
#[derive(Debug, Clone)]
pub struct SocialGenericOAuth {
    base: SocialBase,
    allowed_domains: Vec<String>,
    api_url: String,
    allow_sign_up: bool,
    email_attribute_name: String,
    email_attribute_path: String,
    team_ids: Vec<i64>,
    allowed_organizations: Vec<String>,
}

impl SocialGenericOAuth {
    /// Creates the connector from its settings.
    #[must_use]
    pub fn new(base: SocialBase, settings: &OAuthProviderSettings) -> Self {
        let email_attribute_name = if settings.email_attribute_name.is_empty() {
            DEFAULT_EMAIL_ATTRIBUTE.to_owned()
        } else {
            settings.email_attribute_name.clone()
        };

        Self {
            base,
            allowed_domains: settings.allowed_domains.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_owned(),
            allow_sign_up: settings.allow_sign_up,
            email_attribute_name,
            email_attribute_path: settings.email_attribute_path.clone(),
            team_ids: settings.team_ids.clone(),
            allowed_organizations: settings.allowed_organizations.clone(),
        }
    }

    /// Resolves the email from the configured path, the attribute name, an `attributes` map
    /// entry, or `upn`, in that order.
    fn email_from(&self, user: &Value) -> Option<String> {
        if !self.email_attribute_path.is_empty()
            && let Some(email) = search_email(user, &self.email_attribute_path)
        {
            return Some(email);
        }

        string_field(user, &self.email_attribute_name)
            .or_else(|| {
                user.get("attributes")
                    .and_then(|attributes| attributes.get(&self.email_attribute_name))
                    .and_then(Value::as_array)
                    .and_then(|values| values.first())
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
            .or_else(|| string_field(user, "upn"))
            .filter(|email| !email.is_empty())
    }

    async fn primary_email(&self, token: &str) -> AppResult<String> {
        let url = format!("{}/emails", self.api_url);
        let emails: Vec<GenericEmail> = http_get(self.base.client(token), &url)
            .await?
            .json(&url)?;

        Ok(emails
            .into_iter()
            .find(|email| email.primary)
            .map(|email| email.email)
            .unwrap_or_default())
    }

    async fn is_team_member(&self, token: &str) -> AppResult<bool> {
        if self.team_ids.is_empty() {
            return Ok(true);
        }

        let teams: Vec<GenericTeam> =
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
}

#[async_trait]
impl SocialConnector for SocialGenericOAuth {
    fn provider_type(&self) -> IdentityProvider {
        IdentityProvider::Generic
    }

    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo> {
        let access_token = token.access_token.as_str();
        let user: Value = http_get(self.base.client(access_token), &self.api_url)
            .await
            .and_then(|response| response.json(&self.api_url))
            .map_err(|error| AppError::Unauthorized(format!("error getting user info: {error}")))?;

        let email = match self.email_from(&user) {
            Some(email) => email,
            None => self.primary_email(access_token).await?,
        };
        if email.is_empty() {
            return Err(AppError::IdentityRejected(
                "generic oauth user info carries no email".to_owned(),
            ));
        }

        if !self.is_team_member(access_token).await? {
            warn!(email = %email, "generic oauth user is not a member of an allowed team");
            return Err(DashboardError::MissingTeamMembership.into());
        }

        if !self.is_organization_member(access_token).await? {
            warn!(email = %email, "generic oauth user is not a member of an allowed organization");
            return Err(DashboardError::MissingOrganizationMembership.into());
        }

        let login = string_field(&user, "login")
            .or_else(|| string_field(&user, "username"))
            .unwrap_or_else(|| email.clone());
        let name = string_field(&user, "name")
            .or_else(|| string_field(&user, "display_name"))
            .unwrap_or_else(|| login.clone());

        Ok(BasicUserInfo {
            id: string_field(&user, "id")
                .or_else(|| string_field(&user, "sub"))
                .unwrap_or_default(),
            name,
            email,
            login,
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

/// Reads a string or number field as a string.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Evaluates a JMESPath expression against the user document and keeps a non-empty string result.
fn search_email(value: &Value, path: &str) -> Option<String> {
    let expression = jmespath::compile(path)
        .inspect_err(|error| warn!(path, %error, "invalid email attribute path"))
        .ok()?;
    let result = expression
        .search(value)
        .inspect_err(|error| warn!(path, %error, "email attribute path search failed"))
        .ok()?;

    result.as_string().filter(|email| !email.is_empty()).cloned()
}
