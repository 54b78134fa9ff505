use async_trait::async_trait;
use dashsync_core::AppResult;
use dashsync_domain::{BasicUserInfo, IdentityProvider, UpdateDashboardOptions};
use serde::{Deserialize, Serialize};

/// Access token obtained from an authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Bearer access token.
    pub access_token: String,
    /// Token type reported by the provider, usually `bearer`.
    #[serde(default)]
    pub token_type: String,
    /// Refresh token, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, when reported.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl OAuthToken {
    /// Creates a bearer token without refresh data.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_owned(),
            refresh_token: None,
            expires_in: None,
        }
    }
}

/// Port implemented by every OAuth identity provider.
///
/// Adapters send provider API calls through a client bound to the user's access token.
#[async_trait]
pub trait SocialConnector: Send + Sync {
    /// Identity provider tag.
    fn provider_type(&self) -> IdentityProvider;

    /// Fetches the profile of the token owner and applies the provider's membership policy.
    async fn user_info(&self, token: &OAuthToken) -> AppResult<BasicUserInfo>;

    /// Returns whether the email domain is on the allow-list; an empty list allows all.
    fn is_email_allowed(&self, email: &str) -> bool;

    /// Returns whether unknown users may sign up through this provider.
    fn is_signup_allowed(&self) -> bool;

    /// Mirrors a dashboard change into the provider's repository.
    ///
    /// Providers without mirroring accept and ignore every change.
    async fn update_dashboard(&self, options: &UpdateDashboardOptions, token: &str) -> AppResult<()> {
        let _ = (options, token);
        Ok(())
    }

    /// Builds the provider authorization URL for the given CSRF state.
    fn auth_code_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange(&self, code: &str) -> AppResult<OAuthToken>;
}

/// Domain allow-list check shared by the providers.
#[must_use]
pub fn is_email_allowed(email: &str, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    allowed_domains
        .iter()
        .any(|domain| email.ends_with(&format!("@{domain}")))
}
