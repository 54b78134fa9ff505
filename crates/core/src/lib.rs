//! Shared primitives for all Rust crates in Dashsync.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{OrgRole, SignedInUser};

/// Result type used across Dashsync crates.
pub type AppResult<T> = Result<T, AppError>;

/// Organization identifier used as the partition key for dashboards and repository mappings.
///
/// The zero value is a legitimate "unset" organization and is what a default-constructed
/// identity carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(i64);

impl OrgId {
    /// Creates an organization identifier from its numeric value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for OrgId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Manual write against a resource owned by provisioning.
    #[error("provisioning conflict: {0}")]
    ProvisioningConflict(String),

    /// Operation needs an external identity that the caller does not have.
    #[error("sync required: {0}")]
    SyncRequired(String),

    /// External mirror could not be reached or rejected the write.
    #[error("external sync failure: {0}")]
    ExternalSync(String),

    /// External identity provider account was refused by policy.
    #[error("identity rejected: {0}")]
    IdentityRejected(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
