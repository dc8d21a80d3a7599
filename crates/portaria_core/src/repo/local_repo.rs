//! Local-storage backend: residents and packages as JSON collections.
//!
//! # Responsibility
//! - Implement both repository contracts over `SqliteKvStore`.
//! - Issue record ids and pickup tokens for new records.
//! - Resolve resident snapshots for package reads.
//!
//! # Invariants
//! - Each mutation is one `modify` call on a single collection.
//! - Pickup is re-checked inside the write transaction, so concurrent
//!   validations of one package yield exactly one success.
//! - Deleting a resident never touches the package collection.

use crate::model::now_epoch_ms;
use crate::model::package::{NewPackage, Package, PackageId, PackagePatch};
use crate::model::record_id::RecordId;
use crate::model::resident::{NewResident, Resident, ResidentId, ResidentPatch};
use crate::model::token::generate_pickup_token;
use crate::repo::kv_store::{SqliteKvStore, PACKAGES_KEY, RESIDENTS_KEY};
use crate::repo::{PackageRepository, RepoError, RepoResult, ResidentRepository};
use rusqlite::Connection;
use std::collections::HashMap;

/// SQLite key-value backed front-desk repository.
pub struct LocalRepository<'conn> {
    store: SqliteKvStore<'conn>,
}

impl<'conn> LocalRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            store: SqliteKvStore::try_new(conn)?,
        })
    }

    fn with_snapshots(&self, mut packages: Vec<Package>) -> RepoResult<Vec<Package>> {
        let residents: Vec<Resident> = self.store.read(RESIDENTS_KEY)?;
        let by_id: HashMap<&RecordId, &Resident> =
            residents.iter().map(|resident| (&resident.id, resident)).collect();
        for package in &mut packages {
            package.resident = package
                .resident_id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .map(|resident| (*resident).clone());
        }
        Ok(packages)
    }

    fn with_snapshot(&self, package: Package) -> RepoResult<Package> {
        self.with_snapshots(vec![package])?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::InvalidData("snapshot resolution dropped a record".into()))
    }
}

impl ResidentRepository for LocalRepository<'_> {
    fn list_residents(&self) -> RepoResult<Vec<Resident>> {
        self.store.read(RESIDENTS_KEY)
    }

    fn get_resident(&self, id: &ResidentId) -> RepoResult<Option<Resident>> {
        let residents: Vec<Resident> = self.store.read(RESIDENTS_KEY)?;
        Ok(residents.into_iter().find(|resident| &resident.id == id))
    }

    fn create_resident(&self, input: &NewResident) -> RepoResult<Resident> {
        let resident = Resident::from_new(RecordId::generate(), input.clone());
        self.store.modify(RESIDENTS_KEY, |residents: &mut Vec<Resident>| {
            residents.push(resident.clone());
            Ok(())
        })?;
        Ok(resident)
    }

    fn update_resident(&self, id: &ResidentId, patch: &ResidentPatch) -> RepoResult<Resident> {
        self.store
            .modify(RESIDENTS_KEY, |residents: &mut Vec<Resident>| {
                let resident = residents
                    .iter_mut()
                    .find(|resident| &resident.id == id)
                    .ok_or_else(|| RepoError::NotFound(id.clone()))?;
                resident.apply(patch);
                Ok(resident.clone())
            })
    }

    fn delete_resident(&self, id: &ResidentId) -> RepoResult<()> {
        self.store
            .modify(RESIDENTS_KEY, |residents: &mut Vec<Resident>| {
                let before = residents.len();
                residents.retain(|resident| &resident.id != id);
                if residents.len() == before {
                    return Err(RepoError::NotFound(id.clone()));
                }
                Ok(())
            })
    }
}

impl PackageRepository for LocalRepository<'_> {
    fn list_packages(&self) -> RepoResult<Vec<Package>> {
        let packages: Vec<Package> = self.store.read(PACKAGES_KEY)?;
        self.with_snapshots(packages)
    }

    fn get_package(&self, id: &PackageId) -> RepoResult<Option<Package>> {
        let packages: Vec<Package> = self.store.read(PACKAGES_KEY)?;
        match packages.into_iter().find(|package| &package.id == id) {
            Some(package) => Ok(Some(self.with_snapshot(package)?)),
            None => Ok(None),
        }
    }

    fn create_package(&self, input: &NewPackage) -> RepoResult<Package> {
        let package = Package::new_pending(
            RecordId::generate(),
            input.clone(),
            generate_pickup_token(),
            now_epoch_ms(),
        );
        self.store.modify(PACKAGES_KEY, |packages: &mut Vec<Package>| {
            packages.push(package.clone());
            Ok(())
        })?;
        self.with_snapshot(package)
    }

    fn update_package(&self, id: &PackageId, patch: &PackagePatch) -> RepoResult<Package> {
        let updated = self
            .store
            .modify(PACKAGES_KEY, |packages: &mut Vec<Package>| {
                let package = packages
                    .iter_mut()
                    .find(|package| &package.id == id)
                    .ok_or_else(|| RepoError::NotFound(id.clone()))?;
                package.apply(patch);
                Ok(package.clone())
            })?;
        self.with_snapshot(updated)
    }

    fn delete_package(&self, id: &PackageId) -> RepoResult<()> {
        self.store
            .modify(PACKAGES_KEY, |packages: &mut Vec<Package>| {
                let before = packages.len();
                packages.retain(|package| &package.id != id);
                if packages.len() == before {
                    return Err(RepoError::NotFound(id.clone()));
                }
                Ok(())
            })
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<Package>> {
        let packages: Vec<Package> = self.store.read(PACKAGES_KEY)?;
        // Tokens are only unique among pending packages.
        let pending = packages
            .iter()
            .position(|package| package.token == token && !package.picked_up);
        let index = pending.or_else(|| packages.iter().position(|package| package.token == token));
        match index.and_then(|index| packages.into_iter().nth(index)) {
            Some(package) => Ok(Some(self.with_snapshot(package)?)),
            None => Ok(None),
        }
    }

    fn mark_picked_up(&self, package: &Package, picked_up_at: i64) -> RepoResult<Package> {
        let updated = self
            .store
            .modify(PACKAGES_KEY, |packages: &mut Vec<Package>| {
                let stored = packages
                    .iter_mut()
                    .find(|candidate| candidate.id == package.id)
                    .ok_or_else(|| RepoError::NotFound(package.id.clone()))?;
                stored
                    .mark_picked_up(picked_up_at)
                    .map_err(|previous| RepoError::AlreadyPickedUp {
                        picked_up_at: previous,
                    })?;
                Ok(stored.clone())
            })?;
        self.with_snapshot(updated)
    }
}
