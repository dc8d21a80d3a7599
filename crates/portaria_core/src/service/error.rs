//! Use-case error taxonomy shared by front-desk services.

use crate::model::package::PackageId;
use crate::model::resident::ResidentId;
use crate::model::ValidationError;
use crate::repo::RepoError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, PortariaError>;

/// Failure returned by every front-desk use-case.
///
/// No variant is fatal: callers can always retry after fixing input.
#[derive(Debug, Error)]
pub enum PortariaError {
    /// Missing or blank required input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The (block, unit) pair is already at its occupancy cap.
    #[error("unit {block}/{unit} already has the maximum of {limit} residents")]
    Capacity {
        block: String,
        unit: String,
        limit: usize,
    },
    #[error("resident not found: {0}")]
    ResidentNotFound(ResidentId),
    #[error("package not found: {0}")]
    PackageNotFound(PackageId),
    #[error("no package matches this token")]
    TokenNotFound,
    /// The token was already redeemed; carries the original pickup time.
    #[error("package already picked up (picked_up_at={picked_up_at})")]
    AlreadyProcessed { picked_up_at: i64 },
    /// Storage or network failure with the best available message.
    #[error("storage or network failure: {0}")]
    Transport(#[source] RepoError),
}

impl PortariaError {
    /// Stable machine-readable category for UI layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Capacity { .. } => "capacity",
            Self::ResidentNotFound(_) | Self::PackageNotFound(_) | Self::TokenNotFound => {
                "not_found"
            }
            Self::AlreadyProcessed { .. } => "already_processed",
            Self::Transport(_) => "transport",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "not_found"
    }

    /// Maps a repository error raised while touching a resident.
    pub(crate) fn from_resident_repo(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => Self::ResidentNotFound(id),
            other => Self::from(other),
        }
    }

    /// Maps a repository error raised while touching a package.
    pub(crate) fn from_package_repo(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => Self::PackageNotFound(id),
            other => Self::from(other),
        }
    }
}

impl From<RepoError> for PortariaError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AlreadyPickedUp { picked_up_at } => Self::AlreadyProcessed { picked_up_at },
            RepoError::NotFound(id) => Self::PackageNotFound(id),
            other => Self::Transport(other),
        }
    }
}
