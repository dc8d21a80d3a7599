//! Resident domain model.
//!
//! # Responsibility
//! - Define the resident record and its create/patch inputs.
//! - Validate required fields before persistence.
//!
//! # Invariants
//! - At most `MAX_RESIDENTS_PER_UNIT` residents share one (block, unit)
//!   pair at creation time. Updates are not re-checked.
//! - Block, unit and phone are opaque labels; only whitespace is trimmed.

use super::record_id::RecordId;
use super::{require_field, ValidationError};
use serde::{Deserialize, Serialize};

/// Occupancy cap per (block, unit) pair.
pub const MAX_RESIDENTS_PER_UNIT: usize = 3;

/// Stable identifier of a resident record.
pub type ResidentId = RecordId;

/// Canonical resident record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub first_name: String,
    pub last_name: String,
    /// Building block label, e.g. `A`.
    pub block: String,
    /// Unit number within the block, e.g. `101`.
    pub unit: String,
    /// Free-text phone number used for notification deep links.
    pub phone: String,
}

impl Resident {
    /// Builds a persisted record from validated create input.
    pub fn from_new(id: ResidentId, input: NewResident) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            block: input.block,
            unit: input.unit,
            phone: input.phone,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Returns whether this resident lives in the given (block, unit).
    pub fn occupies(&self, block: &str, unit: &str) -> bool {
        self.block.trim() == block.trim() && self.unit.trim() == unit.trim()
    }

    /// Merges a validated patch into this record.
    pub fn apply(&mut self, patch: &ResidentPatch) {
        if let Some(value) = &patch.first_name {
            self.first_name = value.clone();
        }
        if let Some(value) = &patch.last_name {
            self.last_name = value.clone();
        }
        if let Some(value) = &patch.block {
            self.block = value.clone();
        }
        if let Some(value) = &patch.unit {
            self.unit = value.clone();
        }
        if let Some(value) = &patch.phone {
            self.phone = value.clone();
        }
    }
}

/// Create input for a resident. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResident {
    pub first_name: String,
    pub last_name: String,
    pub block: String,
    pub unit: String,
    pub phone: String,
}

impl NewResident {
    /// Returns a trimmed copy, or the first missing field.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            first_name: require_field("first_name", &self.first_name)?,
            last_name: require_field("last_name", &self.last_name)?,
            block: require_field("block", &self.block)?,
            unit: require_field("unit", &self.unit)?,
            phone: require_field("phone", &self.phone)?,
        })
    }
}

/// Partial update input. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub block: Option<String>,
    pub unit: Option<String>,
    pub phone: Option<String>,
}

impl ResidentPatch {
    /// Returns a trimmed copy. Supplied fields must not be blank.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        fn field(
            name: &'static str,
            value: &Option<String>,
        ) -> Result<Option<String>, ValidationError> {
            value
                .as_deref()
                .map(|raw| require_field(name, raw))
                .transpose()
        }

        Ok(Self {
            first_name: field("first_name", &self.first_name)?,
            last_name: field("last_name", &self.last_name)?,
            block: field("block", &self.block)?,
            unit: field("unit", &self.unit)?,
            phone: field("phone", &self.phone)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.block.is_none()
            && self.unit.is_none()
            && self.phone.is_none()
    }
}
