//! Timer core
//!
//! The state machine that drives work/pause/break/stop cycles, the countdown
//! and accumulator it owns, and the tick source that advances them.

pub mod countdown;
pub mod engine;
pub mod phase;
pub mod session;

// Re-export main types
pub use countdown::{Countdown, ElapsedAccumulator};
pub use engine::{IntervalEngine, TickSource};
pub use phase::{transition, Effect, TimerEvent, TimerPhase, Transition};
pub use session::{DispatchOutcome, Submission, TimerSession, TimerSettings, TimerSnapshot};
