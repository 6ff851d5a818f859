//! Background tasks module
//!
//! Each signed-in user's timer runs in its own task alongside the HTTP server.

pub mod timer_session;

// Re-export main types
pub use timer_session::{spawn_timer_session, DispatchReply, TimerClosed, TimerHandle};
