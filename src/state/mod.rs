//! State management module
//!
//! Server-wide state shared by the HTTP handlers: storage, configuration and
//! the registry of live timer sessions.

pub mod app_state;

// Re-export main types
pub use app_state::{AppState, TimerDefaults};
