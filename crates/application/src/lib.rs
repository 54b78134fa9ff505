//! Application services and ports.

#![forbid(unsafe_code)]

mod dashboard_ports;
mod dashboard_service;
mod social_ports;

pub use dashboard_ports::{
    DashboardAlertSynchronizer, DashboardAlertValidator, DashboardGuardian, DashboardRepository,
    SaveDashboardCommand, SaveDashboardInput, ValidateDashboardBeforeSaveResult,
};
pub use dashboard_service::{DashboardCommandBuilder, DashboardService};
pub use social_ports::{OAuthToken, SocialConnector, SocialConnectorRegistry, is_email_allowed};
