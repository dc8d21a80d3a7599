//! Front-desk domain model.
//!
//! # Responsibility
//! - Define canonical resident and package records used by core services.
//! - Own field-level validation and the package pickup state machine.
//!
//! # Invariants
//! - Every record is identified by an opaque `RecordId` assigned by the
//!   persistence backend.
//! - A package pickup timestamp is written exactly once.

pub mod package;
pub mod record_id;
pub mod resident;
pub mod token;

use thiserror::Error;

/// Field-level validation failure raised before any persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or blank after trimming.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    /// A supplied field has an unusable value.
    #[error("invalid `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Returns the trimmed value or a `MissingField` error when it is blank.
pub(crate) fn require_field(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
