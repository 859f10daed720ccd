//! Domain model for meetup listings ("moves") and the actors viewing them.
//!
//! # Responsibility
//! - Define the canonical move record shared by store, service and views.
//! - Keep per-actor state (joined/saved/host) explicit instead of shared flags.
//!
//! # Invariants
//! - Every move is identified by a stable, non-blank `MoveId`.
//! - `participants` never drops below the number of tracked members.

pub mod actor;
pub mod move_record;
