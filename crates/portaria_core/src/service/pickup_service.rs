//! Pickup token validation.
//!
//! # Responsibility
//! - Redeem a pickup token exactly once.
//!
//! # Invariants
//! - `Pending -> PickedUp` is the only transition; `PickedUp` is terminal.
//! - A repeated redemption reports the original pickup time and leaves the
//!   stored record unchanged.

use crate::model::now_epoch_ms;
use crate::model::package::{Package, PickupState};
use crate::model::token::{normalize_token, redact_token};
use crate::model::ValidationError;
use crate::repo::PackageRepository;
use crate::service::error::{PortariaError, ServiceResult};
use log::{info, warn};

/// Token validator facade over repository implementations.
pub struct PickupService<R: PackageRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: PackageRepository> PickupService<R> {
    /// Creates a validator stamping pickups with the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    /// Creates a validator with a custom epoch-millisecond clock.
    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    /// Redeems `token` and returns the picked-up package.
    ///
    /// # Errors
    /// - `Validation` when the token is blank.
    /// - `TokenNotFound` when no package carries the token.
    /// - `AlreadyProcessed` when the package was already collected.
    pub fn validate(&self, token: &str) -> ServiceResult<Package> {
        let token = normalize_token(token).ok_or(ValidationError::MissingField("token"))?;
        let package = self
            .repo
            .find_by_token(token)?
            .ok_or(PortariaError::TokenNotFound)?;

        if let PickupState::PickedUp { at } = package.state() {
            warn!(
                "event=pickup_validate module=service status=rejected reason=already_processed token={}",
                redact_token(token)
            );
            return Err(PortariaError::AlreadyProcessed { picked_up_at: at });
        }

        let updated = self
            .repo
            .mark_picked_up(&package, (self.clock)())
            .map_err(PortariaError::from_package_repo)?;
        info!(
            "event=pickup_validate module=service status=ok package_id={} token={}",
            updated.id,
            redact_token(token)
        );
        Ok(updated)
    }
}
