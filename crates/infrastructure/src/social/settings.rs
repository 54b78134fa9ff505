use std::collections::BTreeMap;
use std::env;

use dashsync_core::{AppError, AppResult, OrgId};

const DEFAULT_APP_URL: &str = "http://localhost:3000/";
const DEFAULT_GRAFANA_COM_URL: &str = "https://grafana.com";
const LEGACY_GRAFANA_COM_NAME: &str = "grafananet";

/// OAuth provider variants known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OAuthProviderKind {
    /// GitHub.
    Github,
    /// GitLab, the only variant mirroring dashboards.
    Gitlab,
    /// Google.
    Google,
    /// Any OAuth2 provider following the GitHub-like user API.
    GenericOAuth,
    /// grafana.com.
    GrafanaCom,
}

impl OAuthProviderKind {
    /// Every provider in configuration order.
    pub const ALL: [Self; 5] = [
        Self::Github,
        Self::Gitlab,
        Self::Google,
        Self::GenericOAuth,
        Self::GrafanaCom,
    ];

    /// Registry and configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Google => "google",
            Self::GenericOAuth => "generic_oauth",
            Self::GrafanaCom => "grafana_com",
        }
    }

    /// Resolves a configuration name, accepting the legacy `grafananet` alias.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name == LEGACY_GRAFANA_COM_NAME {
            return Some(Self::GrafanaCom);
        }

        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn default_settings(self) -> OAuthProviderSettings {
        let (scopes, auth_url, token_url, api_url): (&[&str], &str, &str, &str) = match self {
            Self::Github => (
                &["user:email", "read:org"],
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                "https://api.github.com/user",
            ),
            Self::Gitlab => (
                &["api"],
                "https://gitlab.com/oauth/authorize",
                "https://gitlab.com/oauth/token",
                "https://gitlab.com/api/v4",
            ),
            Self::Google => (
                &[
                    "https://www.googleapis.com/auth/userinfo.profile",
                    "https://www.googleapis.com/auth/userinfo.email",
                ],
                "https://accounts.google.com/o/oauth2/auth",
                "https://accounts.google.com/o/oauth2/token",
                "https://www.googleapis.com/oauth2/v1/userinfo",
            ),
            Self::GenericOAuth => (&["user:email"], "", "", ""),
            Self::GrafanaCom => (&["user:email"], "", "", ""),
        };

        OAuthProviderSettings {
            name: self.name().to_owned(),
            scopes: scopes.iter().map(|scope| (*scope).to_owned()).collect(),
            auth_url: auth_url.to_owned(),
            token_url: token_url.to_owned(),
            api_url: api_url.to_owned(),
            allow_sign_up: true,
            ..OAuthProviderSettings::default()
        }
    }
}

/// Repository a GitLab mirror writes one organization's dashboards to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMapping {
    /// Organization whose dashboards go to this repository.
    pub org_id: OrgId,
    /// GitLab project id.
    pub repo_id: i64,
    /// Branch commits are made on.
    pub branch: String,
    /// GitLab base URL, with or without the `api/v4` suffix.
    pub url: String,
    /// Directory inside the repository holding the dashboards.
    pub dashboards_path: String,
}

/// Settings of one OAuth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthProviderSettings {
    /// Whether the provider is registered.
    pub enabled: bool,
    /// Display name.
    pub name: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Authorization endpoint.
    pub auth_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// User API base.
    pub api_url: String,
    /// Allowed email domains, empty allows every domain.
    pub allowed_domains: Vec<String>,
    /// Allowed group paths, empty allows every user.
    pub allowed_groups: Vec<String>,
    /// Allowed organization logins, empty allows every user.
    pub allowed_organizations: Vec<String>,
    /// Allowed team ids, empty allows every user.
    pub team_ids: Vec<i64>,
    /// Google hosted domain.
    pub hosted_domain: String,
    /// Attribute carrying the email in generic OAuth responses.
    pub email_attribute_name: String,
    /// Dotted path to the email in generic OAuth responses.
    pub email_attribute_path: String,
    /// Whether unknown users may sign up.
    pub allow_sign_up: bool,
    /// Send the client credentials in the token request body instead of a Basic auth header.
    pub send_client_credentials_via_post: bool,
    /// PEM client certificate path.
    pub tls_client_cert: String,
    /// PEM client key path.
    pub tls_client_key: String,
    /// PEM CA bundle path.
    pub tls_client_ca: String,
    /// Disables server certificate verification.
    pub tls_skip_verify: bool,
    /// GitLab repository mappings.
    pub repos: Vec<RepoMapping>,
}

/// OAuth configuration of every known provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    /// Public application root URL, used to build redirect URLs.
    pub app_url: String,
    /// grafana.com root URL.
    pub grafana_com_url: String,
    /// Provider settings keyed by registry name.
    pub providers: BTreeMap<String, OAuthProviderSettings>,
}

impl OAuthSettings {
    /// Loads settings from process environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads settings through a key lookup.
    ///
    /// Keys follow `AUTH_<PROVIDER>_<KEY>`; `grafana_com` falls back to the legacy `GRAFANANET`
    /// prefix when it is not enabled under its own name.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_url = lookup("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_owned());
        let grafana_com_url = lookup("GRAFANA_COM_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_GRAFANA_COM_URL.to_owned());

        let mut providers = BTreeMap::new();
        for kind in OAuthProviderKind::ALL {
            let mut provider = load_provider(&lookup, kind, kind.name())?;
            if kind == OAuthProviderKind::GrafanaCom && !provider.enabled {
                let legacy = load_provider(&lookup, kind, LEGACY_GRAFANA_COM_NAME)?;
                if legacy.enabled {
                    provider = legacy;
                }
            }
            providers.insert(kind.name().to_owned(), provider);
        }

        Ok(Self {
            app_url,
            grafana_com_url,
            providers,
        })
    }

    /// Returns settings of one provider by name or legacy alias.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&OAuthProviderSettings> {
        OAuthProviderKind::from_name(name).and_then(|kind| self.providers.get(kind.name()))
    }

    /// Reports every known provider with its enabled flag.
    #[must_use]
    pub fn enabled_providers(&self) -> BTreeMap<String, bool> {
        OAuthProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let enabled = self
                    .providers
                    .get(kind.name())
                    .is_some_and(|provider| provider.enabled);
                (kind.name().to_owned(), enabled)
            })
            .collect()
    }

    /// Redirect URL registered with the provider.
    #[must_use]
    pub fn redirect_url(&self, kind: OAuthProviderKind) -> String {
        format!("{}/login/{}", self.app_url.trim_end_matches('/'), kind.name())
    }
}

fn load_provider<F>(
    lookup: &F,
    kind: OAuthProviderKind,
    section: &str,
) -> AppResult<OAuthProviderSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = format!("AUTH_{}_", section.to_ascii_uppercase());
    let key = |name: &str| format!("{prefix}{name}");
    let value = |name: &str| lookup(&key(name)).filter(|value| !value.trim().is_empty());

    let defaults = kind.default_settings();
    let repos = if kind == OAuthProviderKind::Gitlab {
        load_repo_mappings(lookup, &prefix)?
    } else {
        Vec::new()
    };

    Ok(OAuthProviderSettings {
        enabled: parse_bool(&key("ENABLED"), value("ENABLED"), false)?,
        name: value("NAME").unwrap_or(defaults.name),
        client_id: value("CLIENT_ID").unwrap_or_default(),
        client_secret: value("CLIENT_SECRET").unwrap_or_default(),
        scopes: value("SCOPES").map_or(defaults.scopes, |scopes| split_list(&scopes)),
        auth_url: value("AUTH_URL").unwrap_or(defaults.auth_url),
        token_url: value("TOKEN_URL").unwrap_or(defaults.token_url),
        api_url: value("API_URL").unwrap_or(defaults.api_url),
        allowed_domains: value("ALLOWED_DOMAINS").map_or_else(Vec::new, |list| split_list(&list)),
        allowed_groups: value("ALLOWED_GROUPS").map_or_else(Vec::new, |list| split_list(&list)),
        allowed_organizations: value("ALLOWED_ORGANIZATIONS")
            .map_or_else(Vec::new, |list| split_list(&list)),
        team_ids: value("TEAM_IDS")
            .map(|list| parse_team_ids(&key("TEAM_IDS"), &list))
            .transpose()?
            .unwrap_or_default(),
        hosted_domain: value("HOSTED_DOMAIN").unwrap_or_default(),
        email_attribute_name: value("EMAIL_ATTRIBUTE_NAME").unwrap_or_default(),
        email_attribute_path: value("EMAIL_ATTRIBUTE_PATH").unwrap_or_default(),
        allow_sign_up: parse_bool(
            &key("ALLOW_SIGN_UP"),
            value("ALLOW_SIGN_UP"),
            defaults.allow_sign_up,
        )?,
        send_client_credentials_via_post: parse_bool(
            &key("SEND_CLIENT_CREDENTIALS_VIA_POST"),
            value("SEND_CLIENT_CREDENTIALS_VIA_POST"),
            false,
        )?,
        tls_client_cert: value("TLS_CLIENT_CERT").unwrap_or_default(),
        tls_client_key: value("TLS_CLIENT_KEY").unwrap_or_default(),
        tls_client_ca: value("TLS_CLIENT_CA").unwrap_or_default(),
        tls_skip_verify: parse_bool(
            &key("TLS_SKIP_VERIFY_INSECURE"),
            value("TLS_SKIP_VERIFY_INSECURE"),
            false,
        )?,
        repos,
    })
}

fn load_repo_mappings<F>(lookup: &F, prefix: &str) -> AppResult<Vec<RepoMapping>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut repos = Vec::new();

    for index in 0.. {
        let key = |name: &str| format!("{prefix}REPO_{index}_{name}");
        let Some(org_id) = lookup(&key("ORG_ID")) else {
            break;
        };

        let org_id = parse_i64(&key("ORG_ID"), &org_id)?;
        let repo_id = lookup(&key("REPO_ID"))
            .map(|repo_id| parse_i64(&key("REPO_ID"), &repo_id))
            .transpose()?
            .unwrap_or_default();

        repos.push(RepoMapping {
            org_id: OrgId::new(org_id),
            repo_id,
            branch: lookup(&key("BRANCH")).unwrap_or_default(),
            url: lookup(&key("URL")).unwrap_or_default(),
            dashboards_path: lookup(&key("DASHBOARDS_PATH")).unwrap_or_default(),
        });
    }

    Ok(repos)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|character: char| character == ',' || character.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> AppResult<bool> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::Validation(format!(
            "invalid {name}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_i64(name: &str, value: &str) -> AppResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}

fn parse_team_ids(name: &str, value: &str) -> AppResult<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_i64(name, item))
        .collect()
}
