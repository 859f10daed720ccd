//! Record-store contract and its backends.
//!
//! # Responsibility
//! - Define the move store interface used by services and sessions.
//! - Provide in-memory and SQLite implementations with live snapshot feeds.
//!
//! # Invariants
//! - Store writes validate records before persistence.
//! - Stores return semantic errors (`NotFound`, `Unsupported`) in addition to
//!   DB transport errors.

pub mod feed;
pub mod memory_repo;
pub mod move_repo;
pub mod seed;
pub mod sqlite_repo;
