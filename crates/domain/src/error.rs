use dashsync_core::AppError;
use thiserror::Error;

/// Named dashboard failures.
///
/// Each sentinel maps onto one [`AppError`] kind and keeps its message, so callers may match on the
/// kind and compare the message against `DashboardError::X.to_string()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Title is empty after trimming.
    #[error("Dashboard title cannot be empty")]
    TitleEmpty,
    /// A folder was placed inside another folder.
    #[error("A Dashboard Folder cannot be added to another folder")]
    FolderCannotHaveParent,
    /// A folder uses the reserved root folder name.
    #[error("A folder with that name already exists")]
    FolderNameExists,
    /// Uid contains characters outside the short-id alphabet.
    #[error("uid contains illegal characters")]
    InvalidUid,
    /// Uid exceeds the maximum length.
    #[error("uid too long. max 40 characters")]
    UidTooLong,
    /// Guardian refused the save.
    #[error("Access denied to save dashboard")]
    UpdateAccessDenied,
    /// Manual save of a provisioned dashboard.
    #[error("Cannot save provisioned dashboard")]
    CannotSaveProvisioned,
    /// Manual delete of a provisioned dashboard.
    #[error("provisioned dashboard cannot be deleted")]
    CannotDeleteProvisioned,
    /// Stored version differs from the incoming one and overwrite was not requested.
    #[error("The dashboard has been changed by someone else")]
    VersionMismatch,
    /// Another dashboard already uses the uid.
    #[error("A dashboard with the same uid already exists")]
    WithSameUidExists,
    /// Another dashboard in the same folder already uses the title.
    #[error("A dashboard with the same name in the folder already exists")]
    WithSameNameInFolderExists,
    /// A dashboard would turn into a folder or the other way around.
    #[error("Dashboard cannot be changed to a folder")]
    TypeMismatch,
    /// Target folder does not exist.
    #[error("Folder not found")]
    FolderNotFound,
    /// Dashboard does not exist.
    #[error("Dashboard not found")]
    NotFound,
    /// Mirror write failed for any reason.
    #[error("Dashboard could not be synchronized with the external repository")]
    ExternalSyncFailed,
    /// Import was attempted without an external identity token.
    #[error("Dashboard import requires a signed-in external identity to synchronize")]
    ExternalSyncRequired,
    /// External account is in none of the allowed groups.
    #[error("User not a member of one of the required groups")]
    MissingGroupMembership,
    /// External account is in none of the allowed organizations.
    #[error("User not a member of one of the required organizations")]
    MissingOrganizationMembership,
    /// External account is in none of the allowed teams.
    #[error("User not a member of one of the required teams")]
    MissingTeamMembership,
}

impl From<DashboardError> for AppError {
    fn from(error: DashboardError) -> Self {
        let message = error.to_string();
        match error {
            DashboardError::TitleEmpty
            | DashboardError::FolderCannotHaveParent
            | DashboardError::FolderNameExists
            | DashboardError::InvalidUid
            | DashboardError::UidTooLong
            | DashboardError::TypeMismatch => AppError::Validation(message),
            DashboardError::UpdateAccessDenied => AppError::Forbidden(message),
            DashboardError::CannotSaveProvisioned | DashboardError::CannotDeleteProvisioned => {
                AppError::ProvisioningConflict(message)
            }
            DashboardError::VersionMismatch
            | DashboardError::WithSameUidExists
            | DashboardError::WithSameNameInFolderExists => AppError::Conflict(message),
            DashboardError::FolderNotFound | DashboardError::NotFound => {
                AppError::NotFound(message)
            }
            DashboardError::ExternalSyncFailed => AppError::ExternalSync(message),
            DashboardError::ExternalSyncRequired => AppError::SyncRequired(message),
            DashboardError::MissingGroupMembership
            | DashboardError::MissingOrganizationMembership
            | DashboardError::MissingTeamMembership => AppError::IdentityRejected(message),
        }
    }
}
