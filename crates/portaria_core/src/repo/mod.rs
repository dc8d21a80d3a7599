//! Repository contracts and persistence backends.
//!
//! # Responsibility
//! - Define the resident/package data access contracts used by services.
//! - Provide two interchangeable implementations: a local key-value store
//!   over SQLite and a thin REST client.
//!
//! # Invariants
//! - Every write is one read-modify-write unit from the caller's view.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyPickedUp`)
//!   in addition to transport errors.

pub mod kv_store;
pub mod local_repo;
mod remote_dto;
pub mod remote_repo;

use crate::db::DbError;
use crate::model::package::{NewPackage, Package, PackageId, PackagePatch};
use crate::model::record_id::RecordId;
use crate::model::resident::{NewResident, Resident, ResidentId, ResidentPatch};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-boundary error shared by both backends.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("collection serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record not found: {0}")]
    NotFound(RecordId),
    #[error("package already picked up (picked_up_at={picked_up_at})")]
    AlreadyPickedUp { picked_up_at: i64 },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Resident persistence contract.
pub trait ResidentRepository {
    /// Lists residents in persistence order.
    fn list_residents(&self) -> RepoResult<Vec<Resident>>;
    fn get_resident(&self, id: &ResidentId) -> RepoResult<Option<Resident>>;
    /// Persists validated input and returns the record with its new id.
    fn create_resident(&self, input: &NewResident) -> RepoResult<Resident>;
    /// Merges a validated patch. Returns `NotFound` for unknown ids.
    fn update_resident(&self, id: &ResidentId, patch: &ResidentPatch) -> RepoResult<Resident>;
    /// Removes one resident. Packages referencing it are left untouched.
    fn delete_resident(&self, id: &ResidentId) -> RepoResult<()>;
}

/// Package persistence contract.
pub trait PackageRepository {
    /// Lists packages with resident snapshots filled where resolvable.
    fn list_packages(&self) -> RepoResult<Vec<Package>>;
    fn get_package(&self, id: &PackageId) -> RepoResult<Option<Package>>;
    /// Persists a pending package. The backend owns token issuance.
    fn create_package(&self, input: &NewPackage) -> RepoResult<Package>;
    /// Merges editable fields. Pickup fields are never written here.
    fn update_package(&self, id: &PackageId, patch: &PackagePatch) -> RepoResult<Package>;
    fn delete_package(&self, id: &PackageId) -> RepoResult<()>;
    /// Returns the package whose token equals `token` exactly, preferring a
    /// pending one when a collected package reused the same token.
    fn find_by_token(&self, token: &str) -> RepoResult<Option<Package>>;
    /// Records pickup of `package` at `picked_up_at`.
    ///
    /// Returns `AlreadyPickedUp` with the stored timestamp when another
    /// caller won the transition first.
    fn mark_picked_up(&self, package: &Package, picked_up_at: i64) -> RepoResult<Package>;
}

/// Both contracts behind one handle, as selected by configuration.
pub trait FrontDeskRepository: ResidentRepository + PackageRepository {}

impl<T: ResidentRepository + PackageRepository + ?Sized> FrontDeskRepository for T {}

impl<R: ResidentRepository + ?Sized> ResidentRepository for &R {
    fn list_residents(&self) -> RepoResult<Vec<Resident>> {
        (**self).list_residents()
    }

    fn get_resident(&self, id: &ResidentId) -> RepoResult<Option<Resident>> {
        (**self).get_resident(id)
    }

    fn create_resident(&self, input: &NewResident) -> RepoResult<Resident> {
        (**self).create_resident(input)
    }

    fn update_resident(&self, id: &ResidentId, patch: &ResidentPatch) -> RepoResult<Resident> {
        (**self).update_resident(id, patch)
    }

    fn delete_resident(&self, id: &ResidentId) -> RepoResult<()> {
        (**self).delete_resident(id)
    }
}

impl<R: PackageRepository + ?Sized> PackageRepository for &R {
    fn list_packages(&self) -> RepoResult<Vec<Package>> {
        (**self).list_packages()
    }

    fn get_package(&self, id: &PackageId) -> RepoResult<Option<Package>> {
        (**self).get_package(id)
    }

    fn create_package(&self, input: &NewPackage) -> RepoResult<Package> {
        (**self).create_package(input)
    }

    fn update_package(&self, id: &PackageId, patch: &PackagePatch) -> RepoResult<Package> {
        (**self).update_package(id, patch)
    }

    fn delete_package(&self, id: &PackageId) -> RepoResult<()> {
        (**self).delete_package(id)
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<Package>> {
        (**self).find_by_token(token)
    }

    fn mark_picked_up(&self, package: &Package, picked_up_at: i64) -> RepoResult<Package> {
        (**self).mark_picked_up(package, picked_up_at)
    }
}
