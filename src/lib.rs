//! Pokemon search TUI
//!
//! Autocompleting search over the Pokemon GraphQL API: debounced query
//! sync, suggestion and history dropdown, keyboard navigation and an
//! address line with back navigation. Modules are exposed for testing.

pub mod action;
pub mod api;
pub mod components;
pub mod effect;
pub mod fixture;
pub mod history;
pub mod location;
pub mod reducer;
pub mod signal;
pub mod source;
pub mod sprite;
pub mod sprite_backend;
pub mod state;
pub mod suggest;
