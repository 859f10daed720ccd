//! Move use-case service.
//!
//! # Responsibility
//! - Provide the named mutation actions (create, join, save, comment,
//!   delete) on top of any `MoveRepository`.
//! - Validate input before it reaches the store.
//!
//! # Invariants
//! - Join toggles change membership and `participants` in one store update.
//! - Comments are trimmed; blank comments never reach the store.
//! - Capacity is advisory: joining a full move is allowed.

use crate::model::actor::Actor;
use crate::model::move_record::{Comment, Move, MoveId, MovePatch, MoveValidationError, NewMove};
use crate::repo::move_repo::{HostMarking, MoveRepository, RepoError, RepoResult};
use crate::view::card::MoveCard;
use crate::view::projection::{project, ViewConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for move use-cases.
#[derive(Debug)]
pub enum MoveServiceError {
    /// Draft or resulting record breaks a model invariant.
    Validation(MoveValidationError),
    /// Comment text is blank after trimming.
    EmptyComment,
    /// Target move does not exist.
    MoveNotFound(MoveId),
    /// Store deployment does not offer deletion.
    DeleteUnsupported,
    /// Only the host may delete a move.
    NotHost(MoveId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back did not return the record.
    InconsistentState(&'static str),
}

impl MoveServiceError {
    /// Whether this error was raised before anything reached the store.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::EmptyComment | Self::DeleteUnsupported | Self::NotHost(_)
        )
    }
}

impl Display for MoveServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EmptyComment => write!(f, "comment text must not be blank"),
            Self::MoveNotFound(id) => write!(f, "move not found: {id}"),
            Self::DeleteUnsupported => write!(f, "this store does not support deleting moves"),
            Self::NotHost(id) => write!(f, "only the host can delete move {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent move state: {details}"),
        }
    }
}

impl Error for MoveServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MoveServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::MoveNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Unsupported("delete") => Self::DeleteUnsupported,
            other => Self::Repo(other),
        }
    }
}

impl From<MoveValidationError> for MoveServiceError {
    fn from(value: MoveValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Move service facade over repository implementations.
pub struct MoveService<R: MoveRepository> {
    repo: R,
}

impl<R: MoveRepository> MoveService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates a move hosted by `host`.
    ///
    /// # Contract
    /// - Required text fields are trimmed and must be non-blank.
    /// - The host starts joined with `participants = 1`.
    pub fn create_move(&self, host: &Actor, draft: NewMove) -> Result<Move, MoveServiceError> {
        let record = Move::create(draft, host)?;
        let id = self.repo.create_move(&record)?;
        self.read_back(&id, "created move not found in read-back")
    }

    /// Flips `actor`'s join state, adjusting `participants` by exactly one.
    pub fn toggle_join(&self, id: &MoveId, actor: &Actor) -> Result<Move, MoveServiceError> {
        let current = self.require(id)?;
        let patch = current.join_toggle_patch(&actor.id);
        self.repo.update_move(id, &patch)?;
        self.read_back(id, "joined move not found in read-back")
    }

    /// Flips `actor`'s saved state. Participants are untouched.
    pub fn toggle_save(&self, id: &MoveId, actor: &Actor) -> Result<Move, MoveServiceError> {
        let current = self.require(id)?;
        let patch = current.save_toggle_patch(&actor.id);
        self.repo.update_move(id, &patch)?;
        self.read_back(id, "saved move not found in read-back")
    }

    /// Appends a trimmed comment authored by `author`.
    pub fn add_comment(
        &self,
        id: &MoveId,
        author: &Actor,
        text: &str,
    ) -> Result<Move, MoveServiceError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MoveServiceError::EmptyComment);
        }
        let patch = MovePatch {
            append_comment: Some(Comment {
                user: author.display_name.clone(),
                text: trimmed.to_string(),
            }),
            ..MovePatch::default()
        };
        self.repo.update_move(id, &patch)?;
        self.read_back(id, "commented move not found in read-back")
    }

    /// Deletes a move when the store supports it and `actor` hosts it.
    pub fn delete_move(&self, id: &MoveId, actor: &Actor) -> Result<(), MoveServiceError> {
        let capabilities = self.repo.capabilities();
        if !capabilities.supports_delete {
            return Err(MoveServiceError::DeleteUnsupported);
        }
        let current = self.require(id)?;
        if capabilities.host_marking == HostMarking::Creator && !current.is_hosted_by(&actor.id) {
            return Err(MoveServiceError::NotHost(id.clone()));
        }
        self.repo.delete_move(id)?;
        Ok(())
    }

    pub fn get_move(&self, id: &MoveId) -> RepoResult<Option<Move>> {
        self.repo.get_move(id)
    }

    pub fn list_moves(&self) -> RepoResult<Vec<Move>> {
        self.repo.list_moves()
    }

    /// Lists and projects the feed for `viewer` in one call.
    pub fn feed(&self, viewer: &Actor, config: &ViewConfig) -> RepoResult<Vec<MoveCard>> {
        let moves = self.repo.list_moves()?;
        let capabilities = self.repo.capabilities();
        Ok(project(&moves, &viewer.id, config)
            .into_iter()
            .map(|record| MoveCard::for_viewer(record, &viewer.id, capabilities))
            .collect())
    }

    fn require(&self, id: &MoveId) -> Result<Move, MoveServiceError> {
        self.repo
            .get_move(id)?
            .ok_or_else(|| MoveServiceError::MoveNotFound(id.clone()))
    }

    fn read_back(&self, id: &MoveId, details: &'static str) -> Result<Move, MoveServiceError> {
        self.repo
            .get_move(id)?
            .ok_or(MoveServiceError::InconsistentState(details))
    }
}
