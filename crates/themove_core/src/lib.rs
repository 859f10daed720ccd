//! Core domain logic for The Move.
//! This crate is the single source of truth for move invariants and the
//! feed projection rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod view;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::actor::{comment_initial, Actor, ActorId, BlankActorId};
pub use model::move_record::{
    Category, Comment, Move, MoveId, MovePatch, MoveStatus, MoveValidationError, NewMove,
};
pub use repo::feed::{SnapshotFeed, SnapshotListener, Subscription};
pub use repo::memory_repo::InMemoryMoveRepository;
pub use repo::move_repo::{HostMarking, MoveRepository, RepoError, RepoResult, StoreCapabilities};
pub use repo::seed::{sample_moves, seed_if_empty};
pub use repo::sqlite_repo::SqliteMoveRepository;
pub use service::move_service::{MoveService, MoveServiceError};
pub use session::app_state::{ActionOutcome, AppState, SyncMode};
pub use view::card::MoveCard;
pub use view::filter::{FilterSelection, FilterToken, SortOrder, Tab, ViewTokenError};
pub use view::projection::{project, ViewConfig};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
