//! Package ledger use-cases.
//!
//! # Responsibility
//! - Register, edit, list and delete packages.
//! - Trigger the arrival notification after a successful registration.
//! - Rebuild a pickup reminder for any listed package on demand.
//!
//! # Invariants
//! - New packages start `Pending` with a backend-issued token.
//! - Edits never touch pickup fields; see `PickupService` for that.
//! - A notification failure never fails the registration.

use crate::model::package::{NewPackage, Package, PackageId, PackagePatch};
use crate::model::token::{normalize_token, redact_token};
use crate::model::ValidationError;
use crate::notify::{ArrivalNotification, LogNotifier, Notifier};
use crate::repo::{PackageRepository, ResidentRepository};
use crate::service::error::{PortariaError, ServiceResult};
use log::{info, warn};

/// Result of a package registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredPackage {
    pub package: Package,
    /// Arrival notice, when the resident has a usable phone number.
    pub notification: Option<ArrivalNotification>,
}

/// Package ledger facade over repository implementations.
pub struct PackageService<R: ResidentRepository + PackageRepository> {
    repo: R,
    notifier: Box<dyn Notifier>,
}

impl<R: ResidentRepository + PackageRepository> PackageService<R> {
    /// Creates a service that logs arrival notices.
    pub fn new(repo: R) -> Self {
        Self::with_notifier(repo, Box::new(LogNotifier))
    }

    pub fn with_notifier(repo: R, notifier: Box<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Lists packages with resident snapshots where resolvable.
    pub fn list(&self) -> ServiceResult<Vec<Package>> {
        Ok(self.repo.list_packages()?)
    }

    pub fn get(&self, id: &PackageId) -> ServiceResult<Package> {
        self.repo
            .get_package(id)?
            .ok_or_else(|| PortariaError::PackageNotFound(id.clone()))
    }

    /// Registers a package for a resident and notifies them.
    ///
    /// # Errors
    /// - `Validation` when the resident id or origin is blank.
    /// - `ResidentNotFound` when the resident does not exist.
    pub fn create(&self, input: &NewPackage) -> ServiceResult<RegisteredPackage> {
        let input = input.normalized()?;
        let resident = self
            .repo
            .get_resident(&input.resident_id)?
            .ok_or_else(|| PortariaError::ResidentNotFound(input.resident_id.clone()))?;

        let mut package = self.repo.create_package(&input)?;
        if package.resident.is_none() {
            package.resident = Some(resident.clone());
        }
        info!(
            "event=package_create module=service status=ok package_id={} token={}",
            package.id,
            redact_token(&package.token)
        );

        let notification = ArrivalNotification::compose(&resident, &package);
        if let Some(notice) = &notification {
            if let Err(err) = self.notifier.notify(notice) {
                warn!(
                    "event=notify_arrival module=service status=error package_id={} error={}",
                    package.id, err
                );
            }
        }

        Ok(RegisteredPackage {
            package,
            notification,
        })
    }

    /// Builds the pickup reminder for an existing package.
    ///
    /// The returned link is for the shell to open; the configured notifier
    /// is not invoked.
    ///
    /// # Errors
    /// - `PackageNotFound` when the package does not exist.
    /// - `ResidentNotFound` when the package's resident was deleted.
    /// - `Validation` when the resident's phone has no digits.
    pub fn notify(&self, id: &PackageId) -> ServiceResult<ArrivalNotification> {
        let package = self.get(id)?;
        let resident = match package.resident.clone() {
            Some(resident) => resident,
            None => {
                let resident_id = package
                    .resident_id
                    .clone()
                    .ok_or(ValidationError::MissingField("resident_id"))?;
                self.repo
                    .get_resident(&resident_id)?
                    .ok_or(PortariaError::ResidentNotFound(resident_id))?
            }
        };

        let notice = ArrivalNotification::compose_reminder(&resident, &package).ok_or(
            ValidationError::InvalidField {
                field: "phone",
                reason: "O morador não possui telefone cadastrado",
            },
        )?;
        info!(
            "event=package_notify module=service status=ok package_id={} link_len={}",
            package.id,
            notice.link.len()
        );
        Ok(notice)
    }

    /// Edits resident assignment, origin or description.
    pub fn update(&self, id: &PackageId, patch: &PackagePatch) -> ServiceResult<Package> {
        let patch = patch.normalized()?;
        if let Some(resident_id) = &patch.resident_id {
            if self.repo.get_resident(resident_id)?.is_none() {
                return Err(PortariaError::ResidentNotFound(resident_id.clone()));
            }
        }
        self.repo
            .update_package(id, &patch)
            .map_err(PortariaError::from_package_repo)
    }

    pub fn delete(&self, id: &PackageId) -> ServiceResult<()> {
        self.repo
            .delete_package(id)
            .map_err(PortariaError::from_package_repo)?;
        info!("event=package_delete module=service status=ok package_id={id}");
        Ok(())
    }

    /// Finds the package holding `token` (trimmed, otherwise exact).
    pub fn find_by_token(&self, token: &str) -> ServiceResult<Package> {
        let token = normalize_token(token).ok_or(ValidationError::MissingField("token"))?;
        self.repo
            .find_by_token(token)?
            .ok_or(PortariaError::TokenNotFound)
    }
}
