//! Presentation-root session state.

pub mod app_state;
