//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod dashboard;
mod error;
mod provisioning;
mod social;

pub use dashboard::{
    Dashboard, GENERAL_FOLDER_NAME, ROOT_FOLDER_NAME, UID_MAX_LENGTH, is_valid_short_uid, slugify,
};
pub use error::DashboardError;
pub use provisioning::ProvisioningRecord;
pub use social::{BasicUserInfo, DashboardAction, IdentityProvider, UpdateDashboardOptions};
