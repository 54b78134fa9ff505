use serde::{Deserialize, Serialize};

use crate::OrgId;

/// Role a user holds inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OrgRole {
    /// Read-only member.
    Viewer,
    /// Member allowed to edit content.
    Editor,
    /// Organization administrator.
    Admin,
}

impl OrgRole {
    /// Returns the stable role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Admin",
        }
    }
}

/// User acting on a request, as resolved by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    user_id: i64,
    org_id: OrgId,
    org_role: OrgRole,
    login: String,
    auth_module: Option<String>,
    oauth_token: Option<String>,
}

impl SignedInUser {
    /// Creates a locally authenticated user without an external identity.
    #[must_use]
    pub fn new(user_id: i64, org_id: OrgId, org_role: OrgRole, login: impl Into<String>) -> Self {
        Self {
            user_id,
            org_id,
            org_role,
            login: login.into(),
            auth_module: None,
            oauth_token: None,
        }
    }

    /// Synthetic administrator used by provisioning flows.
    ///
    /// Carries user id `0` and the given organization.
    #[must_use]
    pub fn provisioning_admin(org_id: OrgId) -> Self {
        Self::new(0, org_id, OrgRole::Admin, "")
    }

    /// Attaches the OAuth provider name and access token the user signed in with.
    #[must_use]
    pub fn with_external_identity(
        mut self,
        auth_module: impl Into<String>,
        oauth_token: impl Into<String>,
    ) -> Self {
        self.auth_module = Some(auth_module.into());
        self.oauth_token = Some(oauth_token.into());
        self
    }

    /// Returns the numeric user id.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the organization the user is acting in.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the role held in the organization.
    #[must_use]
    pub fn org_role(&self) -> OrgRole {
        self.org_role
    }

    /// Returns the login name.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }

    /// Returns the OAuth provider name, if the user signed in through one.
    #[must_use]
    pub fn auth_module(&self) -> Option<&str> {
        self.auth_module.as_deref()
    }

    /// Returns the OAuth access token when present and non-empty.
    #[must_use]
    pub fn external_token(&self) -> Option<&str> {
        self.oauth_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
