//! Core domain logic for the Portaria front desk.
//! This crate is the single source of truth for resident and package rules.

pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use backend::{Backend, BackendError, BackendRepository};
pub use config::{BackendConfig, ConfigError, PortariaConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::package::{NewPackage, Package, PackageId, PackagePatch, PickupState};
pub use model::record_id::RecordId;
pub use model::resident::{
    NewResident, Resident, ResidentId, ResidentPatch, MAX_RESIDENTS_PER_UNIT,
};
pub use model::ValidationError;
pub use notify::{ArrivalNotification, LogNotifier, Notifier, NotifyError};
pub use repo::local_repo::LocalRepository;
pub use repo::remote_repo::RemoteRepository;
pub use repo::{FrontDeskRepository, PackageRepository, RepoError, RepoResult, ResidentRepository};
pub use service::error::{PortariaError, ServiceResult};
pub use service::package_service::{PackageService, RegisteredPackage};
pub use service::pickup_service::PickupService;
pub use service::resident_service::{ResidentService, UnitOccupancy};
pub use service::summary_service::{DeskSummary, SummaryService, DEFAULT_RECENT_LIMIT};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
