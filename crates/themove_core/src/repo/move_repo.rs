//! Move store contract shared by every backend.
//!
//! # Responsibility
//! - Define the record-store operations the app core relies on.
//! - Describe deployment differences as explicit capabilities.
//!
//! # Invariants
//! - Write paths validate the resulting record before persisting it.
//! - Every committed write publishes a full snapshot to subscribers.
//! - `list_moves` returns newest first (`created_at DESC`, then id descending).

use crate::db::DbError;
use crate::model::move_record::{Move, MoveId, MovePatch, MoveValidationError};
use crate::repo::feed::{SnapshotListener, Subscription};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for move persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(MoveValidationError),
    Db(DbError),
    NotFound(MoveId),
    DuplicateId(MoveId),
    /// Operation not offered by this deployment (for example delete).
    Unsupported(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "move not found: {id}"),
            Self::DuplicateId(id) => write!(f, "move id already exists: {id}"),
            Self::Unsupported(operation) => {
                write!(f, "operation not supported by this store: {operation}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted move data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::DuplicateId(_)
            | Self::Unsupported(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<MoveValidationError> for RepoError {
    fn from(value: MoveValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// How `isHost` is computed for a viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMarking {
    /// Only the creator of a move is its host.
    #[default]
    Creator,
    /// Every viewer is treated as host (legacy live-feed deployments).
    Everyone,
}

/// Optional behaviors that differ between store deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCapabilities {
    pub supports_delete: bool,
    pub host_marking: HostMarking,
}

/// Record-store interface for moves.
pub trait MoveRepository {
    fn capabilities(&self) -> StoreCapabilities;
    /// All moves, newest first.
    fn list_moves(&self) -> RepoResult<Vec<Move>>;
    fn get_move(&self, id: &MoveId) -> RepoResult<Option<Move>>;
    fn create_move(&self, record: &Move) -> RepoResult<MoveId>;
    /// Applies a partial update. Empty patches are accepted and still publish.
    fn update_move(&self, id: &MoveId, patch: &MovePatch) -> RepoResult<()>;
    /// Removes a move. Returns `RepoError::Unsupported` without the capability.
    fn delete_move(&self, id: &MoveId) -> RepoResult<()>;
    /// Registers a snapshot listener; dropping the handle unsubscribes.
    fn subscribe(&self, listener: SnapshotListener) -> RepoResult<Subscription>;
}

/// Orders a snapshot newest first, breaking ties by id descending.
pub(crate) fn sort_newest_first(moves: &mut [Move]) {
    moves.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
