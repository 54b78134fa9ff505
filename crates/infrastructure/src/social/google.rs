use async_trait::async_trait;
use dashsync_application::{OAuthToken, SocialConnector, is_email_allowed};
use dashsync_core::{AppError, AppResult};
use dashsync_domain::{BasicUserInfo, IdentityProvider};
use serde::Deserialize;
use tracing::warn;

use super::base::SocialBase;
use super::http::http_get;
use super::settings::OAuthProviderSettings;

#[derive(Debug, Deserialize)]
struct GoogleUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    hd: Option<String>,
}

/// Google identity provider, optionally restricted to one hosted domain.
#[derive(Debug, Clone)]
pub struct SocialGoogle {
    base: SocialBase,
    allowed_domains: Vec<String>,
    hosted_domain: String,
    api_url: String,
    allow_sign_up: bool,
}

impl SocialGoogle {
    /// Creates the connector from its settings.
    #[must_use]
    pub fn new(base: SocialBase, settings: &OAuthProviderSettings) -> Self {
        Self {
            base,
            allowed_domains: settings.allowed_domains.clone(),
            hosted_domain: settings.hosted_domain.clone(),
            api_url: settings.api_url.clone(),
            allow_sign_up: settings.allow_sign_up,
        }
    }
}

#[async_trait]
impl SocialConnector for SocialGoogle {
    fn provider_type(&self) -> IdentityProvider {
        IdentityProvider::Google
    }

    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo> {
        let user: GoogleUser = http_get(self.base.client(&token.access_token), &self.api_url)
            .await
            .and_then(|response| response.json(&self.api_url))
            .map_err(|error| AppError::Unauthorized(format!("error getting user info: {error}")))?;

        if !self.hosted_domain.is_empty()
            && user.hd.as_deref().is_some_and(|hd| hd != self.hosted_domain)
        {
            warn!(email = %user.email, "Google user belongs to another hosted domain");
            return Err(AppError::IdentityRejected(format!(
                "user is not a member of hosted domain {}",
                self.hosted_domain
            )));
        }

        Ok(BasicUserInfo {
            id: user.id,
            name: user.name,
            login: user.email.clone(),
            email: user.email,
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
        if self.hosted_domain.is_empty() {
            self.base.auth_code_url(state, &[])
        } else {
            self.base
                .auth_code_url(state, &[("hd", self.hosted_domain.as_str())])
        }
    }

    async fn exchange(&self, code: &str) -> AppResult<OAuthToken> {
        self.base.exchange(code).await
    }
}
