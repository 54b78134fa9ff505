//! OAuth identity providers and the GitLab dashboard mirror.

mod base;
mod generic_oauth;
mod github;
mod gitlab;
mod google;
mod grafana_com;
mod http;
mod settings;

#[cfg(test)]
pub(crate) mod test_server;

use std::sync::Arc;

use dashsync_application::{SocialConnector, SocialConnectorRegistry};
use dashsync_core::AppResult;
use tracing::info;

pub use base::{AuthorizedClient, OAuthClientConfig, SocialBase, build_http_client};
pub use generic_oauth::SocialGenericOAuth;
pub use github::SocialGithub;
pub use gitlab::SocialGitlab;
pub use google::SocialGoogle;
pub use grafana_com::SocialGrafanaCom;
pub use settings::{OAuthProviderKind, OAuthProviderSettings, OAuthSettings, RepoMapping};

/// Builds one connector per enabled provider, keyed by provider name.
pub fn build_social_connector_registry(
    settings: &OAuthSettings,
) -> AppResult<SocialConnectorRegistry> {
    let mut connectors: Vec<(String, Arc<dyn SocialConnector>)> = Vec::new();

    for kind in OAuthProviderKind::ALL {
        let Some(provider) = settings
            .providers
            .get(kind.name())
            .filter(|provider| provider.enabled)
        else {
            continue;
        };

        let mut client_config =
            OAuthClientConfig::from_settings(provider, settings.redirect_url(kind));
        if kind == OAuthProviderKind::GrafanaCom {
            client_config.auth_url = format!("{}/oauth2/authorize", settings.grafana_com_url);
            client_config.token_url = format!("{}/api/oauth2/token", settings.grafana_com_url);
        }
        if client_config.send_client_credentials_via_post {
            info!(
                provider = kind.name(),
                "sending oauth client credentials in the token request body"
            );
        }

        let base = SocialBase::new(kind.name(), client_config, build_http_client(provider)?)?;
        let connector: Arc<dyn SocialConnector> = match kind {
            OAuthProviderKind::Github => Arc::new(SocialGithub::new(base, provider)),
            OAuthProviderKind::Gitlab => Arc::new(SocialGitlab::new(base, provider)),
            OAuthProviderKind::Google => Arc::new(SocialGoogle::new(base, provider)),
            OAuthProviderKind::GenericOAuth => Arc::new(SocialGenericOAuth::new(base, provider)),
            OAuthProviderKind::GrafanaCom => Arc::new(SocialGrafanaCom::new(
                base,
                &settings.grafana_com_url,
                provider,
            )),
        };

        info!(provider = kind.name(), "oauth provider enabled");
        connectors.push((kind.name().to_owned(), connector));
    }

    Ok(SocialConnectorRegistry::new(connectors))
}
