mod alerts;
mod guardian;
mod inputs;
mod repository;

pub use alerts::{DashboardAlertSynchronizer, DashboardAlertValidator};
pub use guardian::DashboardGuardian;
pub use inputs::{SaveDashboardCommand, SaveDashboardInput, ValidateDashboardBeforeSaveResult};
pub use repository::DashboardRepository;
