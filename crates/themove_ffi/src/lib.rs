//! Flutter-facing FFI surface for The Move.
//!
//! All exported functions live in [`api`] and are bridged with
//! `flutter_rust_bridge`.

pub mod api;
