use std::fs;
use std::time::Duration;

use dashsync_application::OAuthToken;
use dashsync_core::{AppError, AppResult};
use reqwest::header::ACCEPT;
use tracing::warn;
use url::Url;

use super::settings::OAuthProviderSettings;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth2 client endpoints and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Redirect URL registered with the provider.
    pub redirect_url: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Send the client credentials in the token request body.
    pub send_client_credentials_via_post: bool,
}

impl OAuthClientConfig {
    /// Builds the client config of a provider.
    #[must_use]
    pub fn from_settings(
        settings: &OAuthProviderSettings,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            auth_url: settings.auth_url.clone(),
            token_url: settings.token_url.clone(),
            redirect_url: redirect_url.into(),
            scopes: settings.scopes.clone(),
            send_client_credentials_via_post: settings.send_client_credentials_via_post,
        }
    }
}

/// Token endpoint error body.
#[derive(Debug, serde::Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Provider HTTP client bound to one bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizedClient<'a> {
    http_client: &'a reqwest::Client,
    token: &'a str,
}

impl AuthorizedClient<'_> {
    /// Starts an authenticated GET.
    #[must_use]
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http_client.get(url).bearer_auth(self.token)
    }

    /// Starts an authenticated POST.
    #[must_use]
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.http_client.post(url).bearer_auth(self.token)
    }
}

/// OAuth2 plumbing shared by every provider variant.
#[derive(Debug, Clone)]
pub struct SocialBase {
    provider: &'static str,
    config: OAuthClientConfig,
    auth_url: Url,
    http_client: reqwest::Client,
}

impl SocialBase {
    /// Creates the shared client, validating the authorization endpoint.
    pub fn new(
        provider: &'static str,
        config: OAuthClientConfig,
        http_client: reqwest::Client,
    ) -> AppResult<Self> {
        let auth_url = Url::parse(&config.auth_url).map_err(|error| {
            AppError::Validation(format!(
                "invalid auth_url '{}' for oauth provider '{provider}': {error}",
                config.auth_url
            ))
        })?;

        Ok(Self {
            provider,
            config,
            auth_url,
            http_client,
        })
    }

    /// Provider name used in logs.
    #[must_use]
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Client config.
    #[must_use]
    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// HTTP client carrying the provider's TLS material.
    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Client authenticating every request with the user's access token.
    #[must_use]
    pub fn client<'a>(&'a self, token: &'a str) -> AuthorizedClient<'a> {
        AuthorizedClient {
            http_client: &self.http_client,
            token,
        }
    }

    /// Builds the authorization URL with extra provider-specific parameters.
    #[must_use]
    pub fn auth_code_url(&self, state: &str, extra: &[(&str, &str)]) -> String {
        let mut url = self.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("response_type", "code");
            if !self.config.redirect_url.is_empty() {
                query.append_pair("redirect_uri", &self.config.redirect_url);
            }
            if !self.config.scopes.is_empty() {
                query.append_pair("scope", &self.config.scopes.join(" "));
            }
            if !state.is_empty() {
                query.append_pair("state", state);
            }
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }

        url.into()
    }

    /// Exchanges an authorization code at the token endpoint.
    pub async fn exchange(&self, code: &str) -> AppResult<OAuthToken> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let mut request = self
            .http_client
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json");
        if self.config.send_client_credentials_via_post {
            form.push(("client_id", self.config.client_id.as_str()));
            form.push(("client_secret", self.config.client_secret.as_str()));
        } else {
            request = request.basic_auth(&self.config.client_id, Some(&self.config.client_secret));
        }

        let response = request.form(&form).send().await.map_err(|error| {
            warn!(provider = self.provider, error = %error, "oauth token request failed");
            AppError::Unauthorized(format!("oauth token exchange failed: {error}"))
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|error| {
            AppError::Unauthorized(format!("oauth token response could not be read: {error}"))
        })?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<TokenErrorResponse>(&body)
                .map(|error| format!("{} {}", error.error, error.error_description))
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            warn!(
                provider = self.provider,
                status = %status,
                "oauth token endpoint rejected the code"
            );
            return Err(AppError::Unauthorized(format!(
                "oauth token exchange failed with status {status}: {}",
                reason.trim()
            )));
        }

        let token: OAuthToken = serde_json::from_slice(&body).map_err(|error| {
            AppError::Unauthorized(format!("oauth token response is malformed: {error}"))
        })?;
        if token.access_token.is_empty() {
            return Err(AppError::Unauthorized(
                "oauth token response is missing access_token".to_owned(),
            ));
        }

        Ok(token)
    }
}

/// Builds the HTTP client of a provider from its TLS settings.
pub fn build_http_client(settings: &OAuthProviderSettings) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(HTTP_TIMEOUT);

    if settings.tls_skip_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if !settings.tls_client_ca.is_empty() {
        let pem = read_pem(&settings.tls_client_ca)?;
        let certificate = reqwest::Certificate::from_pem(&pem).map_err(|error| {
            AppError::Validation(format!(
                "invalid tls_client_ca '{}': {error}",
                settings.tls_client_ca
            ))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    if !settings.tls_client_cert.is_empty() && !settings.tls_client_key.is_empty() {
        let mut pem = read_pem(&settings.tls_client_cert)?;
        pem.extend(read_pem(&settings.tls_client_key)?);
        let identity = reqwest::Identity::from_pem(&pem).map_err(|error| {
            AppError::Validation(format!("invalid tls client certificate or key: {error}"))
        })?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build oauth http client: {error}")))
}

fn read_pem(path: &str) -> AppResult<Vec<u8>> {
    fs::read(path)
        .map_err(|error| AppError::Validation(format!("failed to read '{path}': {error}")))
}
