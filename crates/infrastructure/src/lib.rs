//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_dashboard_alert_store;
mod in_memory_dashboard_repository;
mod org_role_dashboard_guardian;
mod social;

pub use in_memory_dashboard_alert_store::{DashboardAlertRule, InMemoryDashboardAlertStore};
pub use in_memory_dashboard_repository::InMemoryDashboardRepository;
pub use org_role_dashboard_guardian::OrgRoleDashboardGuardian;
pub use social::{
    AuthorizedClient, OAuthClientConfig, OAuthProviderKind, OAuthProviderSettings, OAuthSettings,
    RepoMapping, SocialBase, SocialGenericOAuth, SocialGithub, SocialGitlab, SocialGoogle,
    SocialGrafanaCom, build_http_client, build_social_connector_registry,
};

#[cfg(test)]
mod tests;
