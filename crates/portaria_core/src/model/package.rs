//! Package domain model and pickup state machine.
//!
//! # Responsibility
//! - Define the package record and its create/patch inputs.
//! - Own the `Pending -> PickedUp` transition.
//!
//! # Invariants
//! - `picked_up_at` is `Some` iff `picked_up` is `true`.
//! - `picked_up_at` is written once, on the false -> true transition.
//! - Deleting the owning resident leaves `resident_id` dangling; reads then
//!   carry no resident snapshot.

use super::record_id::RecordId;
use super::resident::{Resident, ResidentId};
use super::{require_field, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable identifier of a package record.
pub type PackageId = RecordId;

/// Pickup lifecycle of one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupState {
    /// Received at the desk, waiting for the resident.
    Pending,
    /// Collected. Terminal.
    PickedUp { at: i64 },
}

/// Canonical package record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    /// Owning resident. May point at a deleted record.
    pub resident_id: Option<ResidentId>,
    /// Denormalized resident fields, filled on read. Never persisted locally.
    #[serde(skip)]
    pub resident: Option<Resident>,
    /// Carrier or store label, e.g. `Shopee`.
    pub origin: String,
    pub description: Option<String>,
    /// Pickup token shown to the resident.
    pub token: String,
    /// Unix epoch milliseconds.
    pub received_at: i64,
    pub picked_up: bool,
    /// Unix epoch milliseconds. Set once, together with `picked_up`.
    pub picked_up_at: Option<i64>,
}

impl Package {
    /// Builds a pending package from validated create input.
    pub fn new_pending(
        id: PackageId,
        input: NewPackage,
        token: impl Into<String>,
        received_at: i64,
    ) -> Self {
        Self {
            id,
            resident_id: Some(input.resident_id),
            resident: None,
            origin: input.origin,
            description: input.description,
            token: token.into(),
            received_at,
            picked_up: false,
            picked_up_at: None,
        }
    }

    pub fn state(&self) -> PickupState {
        match (self.picked_up, self.picked_up_at) {
            (true, Some(at)) => PickupState::PickedUp { at },
            // A flag without a timestamp came from an older record; report
            // the receipt time so callers still get a displayable instant.
            (true, None) => PickupState::PickedUp {
                at: self.received_at,
            },
            (false, _) => PickupState::Pending,
        }
    }

    /// Transitions `Pending -> PickedUp`.
    ///
    /// Returns the original pickup time when the package was already
    /// collected; the record is left untouched in that case.
    pub fn mark_picked_up(&mut self, at: i64) -> Result<(), i64> {
        if let PickupState::PickedUp { at: previous } = self.state() {
            return Err(previous);
        }
        self.picked_up = true;
        self.picked_up_at = Some(at);
        Ok(())
    }

    /// Merges a validated patch. Pickup fields are never touched.
    pub fn apply(&mut self, patch: &PackagePatch) {
        if let Some(resident_id) = &patch.resident_id {
            self.resident_id = Some(resident_id.clone());
        }
        if let Some(origin) = &patch.origin {
            self.origin = origin.clone();
        }
        if let Some(description) = &patch.description {
            self.description = non_blank(description);
        }
    }

    /// Returns the resident display name, or `—` for orphaned packages.
    pub fn resident_label(&self) -> String {
        self.resident
            .as_ref()
            .map(Resident::full_name)
            .unwrap_or_else(|| "—".to_string())
    }
}

/// Create input for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPackage {
    pub resident_id: ResidentId,
    pub origin: String,
    pub description: Option<String>,
}

impl NewPackage {
    /// Returns a trimmed copy, or the first missing field.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if self.resident_id.is_blank() {
            return Err(ValidationError::MissingField("resident_id"));
        }
        Ok(Self {
            resident_id: self.resident_id.clone(),
            origin: require_field("origin", &self.origin)?,
            description: self.description.as_deref().and_then(non_blank),
        })
    }
}

/// Partial update input for editable package fields.
///
/// A blank `description` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePatch {
    pub resident_id: Option<ResidentId>,
    pub origin: Option<String>,
    pub description: Option<String>,
}

impl PackagePatch {
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if self
            .resident_id
            .as_ref()
            .is_some_and(|resident_id| resident_id.is_blank())
        {
            return Err(ValidationError::MissingField("resident_id"));
        }
        Ok(Self {
            resident_id: self.resident_id.clone(),
            origin: self
                .origin
                .as_deref()
                .map(|origin| require_field("origin", origin))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|description| description.trim().to_string()),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
