//! Focus Timer - A Pomodoro-style timer server
//!
//! Signed-in users run work/break cycles against a server-side timer; each
//! stopped cycle is recorded as a work session with its counted duration.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::AppError;
pub use state::{AppState, TimerDefaults};
pub use timer::{TimerEvent, TimerPhase};
pub use utils::signals::shutdown_signal;
