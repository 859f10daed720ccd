//! Feed view configuration and projection engine.
//!
//! # Responsibility
//! - Parse and edit the UI's view inputs (search, filters, sort, tab).
//! - Derive the ordered, per-viewer list of moves to render.
//!
//! # Invariants
//! - Projection is a pure function of records, viewer and `ViewConfig`.

pub mod card;
pub mod filter;
pub mod projection;
