//! Backend selection.
//!
//! # Responsibility
//! - Open the persistence backend chosen by `BackendConfig`.
//! - Hand out one `FrontDeskRepository` handle regardless of the choice.
//!
//! # Invariants
//! - The local backend owns a migrated SQLite connection for its lifetime.
//! - Callers never branch on the backend kind to run a use-case.

use crate::config::{parse_api_url, timeout_from_secs, BackendConfig, ConfigError};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::local_repo::LocalRepository;
use crate::repo::remote_repo::RemoteRepository;
use crate::repo::{FrontDeskRepository, RepoError};
use log::info;
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// An opened persistence backend.
pub enum Backend {
    Local(Connection),
    Remote(RemoteRepository),
}

impl Backend {
    /// Opens the backend described by `config`.
    ///
    /// # Errors
    /// - Local: the database cannot be opened or migrated.
    /// - Remote: the base URL is invalid or the HTTP client cannot be built.
    pub fn open(config: &BackendConfig) -> Result<Self, BackendError> {
        let backend = match config {
            BackendConfig::Local { db_path } => Self::Local(open_db(db_path)?),
            BackendConfig::Remote {
                base_url,
                timeout_secs,
            } => {
                let url = parse_api_url(base_url)?;
                Self::Remote(RemoteRepository::new(
                    url,
                    timeout_from_secs(*timeout_secs),
                )?)
            }
        };
        info!(
            "event=backend_open module=backend status=ok kind={}",
            backend.kind()
        );
        Ok(backend)
    }

    /// Opens a throwaway local backend in memory.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        Ok(Self::Local(open_db_in_memory()?))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }

    /// Returns the repository handle for this backend.
    pub fn repository(&self) -> Result<BackendRepository<'_>, BackendError> {
        Ok(match self {
            Self::Local(conn) => BackendRepository::Local(LocalRepository::try_new(conn)?),
            Self::Remote(remote) => BackendRepository::Remote(remote),
        })
    }
}

/// Borrowed repository over an opened `Backend`.
pub enum BackendRepository<'a> {
    Local(LocalRepository<'a>),
    Remote(&'a RemoteRepository),
}

impl BackendRepository<'_> {
    /// Erases the concrete backend behind the shared contracts.
    pub fn as_dyn(&self) -> &dyn FrontDeskRepository {
        match self {
            Self::Local(repo) => repo,
            Self::Remote(repo) => *repo,
        }
    }
}
