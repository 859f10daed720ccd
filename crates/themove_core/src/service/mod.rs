//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into named user actions.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod move_service;
