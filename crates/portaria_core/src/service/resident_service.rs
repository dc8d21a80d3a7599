//! Resident registry use-cases.
//!
//! # Responsibility
//! - Validate resident input and enforce the occupancy cap on create.
//! - Provide search and per-unit grouping for the registry screen.
//!
//! # Invariants
//! - A create never leaves more than `MAX_RESIDENTS_PER_UNIT` residents in
//!   one (block, unit). A rejected create writes nothing.
//! - Updates are not re-checked against the cap.
//! - Deleting a resident never touches packages.

use crate::model::resident::{
    NewResident, Resident, ResidentId, ResidentPatch, MAX_RESIDENTS_PER_UNIT,
};
use crate::repo::ResidentRepository;
use crate::service::error::{PortariaError, ServiceResult};
use log::{info, warn};

/// Residents sharing one (block, unit) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOccupancy {
    pub block: String,
    pub unit: String,
    pub residents: Vec<Resident>,
    /// Always `MAX_RESIDENTS_PER_UNIT`; carried for `count/limit` display.
    pub limit: usize,
}

impl UnitOccupancy {
    pub fn count(&self) -> usize {
        self.residents.len()
    }

    pub fn is_full(&self) -> bool {
        self.count() >= self.limit
    }
}

/// Resident registry facade over repository implementations.
pub struct ResidentService<R: ResidentRepository> {
    repo: R,
}

impl<R: ResidentRepository> ResidentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all residents in persistence order.
    pub fn list(&self) -> ServiceResult<Vec<Resident>> {
        Ok(self.repo.list_residents()?)
    }

    pub fn get(&self, id: &ResidentId) -> ServiceResult<Resident> {
        self.repo
            .get_resident(id)?
            .ok_or_else(|| PortariaError::ResidentNotFound(id.clone()))
    }

    /// Registers a resident.
    ///
    /// # Errors
    /// - `Validation` when a required field is blank.
    /// - `Capacity` when the unit already holds the maximum residents.
    pub fn create(&self, input: &NewResident) -> ServiceResult<Resident> {
        let input = input.normalized()?;
        let occupants = self
            .repo
            .list_residents()?
            .iter()
            .filter(|resident| resident.occupies(&input.block, &input.unit))
            .count();
        if occupants >= MAX_RESIDENTS_PER_UNIT {
            warn!(
                "event=resident_create module=service status=rejected reason=capacity occupants={}",
                occupants
            );
            return Err(PortariaError::Capacity {
                block: input.block,
                unit: input.unit,
                limit: MAX_RESIDENTS_PER_UNIT,
            });
        }

        let resident = self.repo.create_resident(&input)?;
        info!(
            "event=resident_create module=service status=ok resident_id={}",
            resident.id
        );
        Ok(resident)
    }

    /// Merges supplied fields into an existing resident.
    pub fn update(&self, id: &ResidentId, patch: &ResidentPatch) -> ServiceResult<Resident> {
        let patch = patch.normalized()?;
        if patch.is_empty() {
            return self.get(id);
        }
        self.repo
            .update_resident(id, &patch)
            .map_err(PortariaError::from_resident_repo)
    }

    /// Removes a resident. Their packages stay and become orphaned.
    pub fn delete(&self, id: &ResidentId) -> ServiceResult<()> {
        self.repo
            .delete_resident(id)
            .map_err(PortariaError::from_resident_repo)?;
        info!("event=resident_delete module=service status=ok resident_id={id}");
        Ok(())
    }

    /// Filters residents by name, block or unit.
    ///
    /// First name, last name, full name (`"Ana Silva"`) and block match
    /// case-insensitively; units match verbatim. A blank query returns
    /// everyone.
    pub fn search(&self, query: &str) -> ServiceResult<Vec<Resident>> {
        let residents = self.repo.list_residents()?;
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(residents);
        }
        let lowered = needle.to_lowercase();
        Ok(residents
            .into_iter()
            .filter(|resident| {
                resident.first_name.to_lowercase().contains(&lowered)
                    || resident.last_name.to_lowercase().contains(&lowered)
                    || resident.full_name().to_lowercase().contains(&lowered)
                    || resident.block.to_lowercase().contains(&lowered)
                    || resident.unit.contains(needle)
            })
            .collect())
    }

    /// Groups residents by (block, unit) in first-seen order.
    pub fn occupancy(&self) -> ServiceResult<Vec<UnitOccupancy>> {
        let mut groups: Vec<UnitOccupancy> = Vec::new();
        for resident in self.repo.list_residents()? {
            match groups
                .iter_mut()
                .find(|group| resident.occupies(&group.block, &group.unit))
            {
                Some(group) => group.residents.push(resident),
                None => groups.push(UnitOccupancy {
                    block: resident.block.trim().to_string(),
                    unit: resident.unit.trim().to_string(),
                    residents: vec![resident],
                    limit: MAX_RESIDENTS_PER_UNIT,
                }),
            }
        }
        Ok(groups)
    }
}
