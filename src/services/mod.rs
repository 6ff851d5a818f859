//! Collaborators of the timer core
//!
//! Storage of accounts and work sessions, identity lookups from request
//! headers, and profile reporting.

pub mod identity;
pub mod report;
pub mod store;

// Re-export main types
pub use identity::{current_user, require_user, update_user_settings};
pub use report::{profile_report, week_start, ProfileReport};
pub use store::{NewWorkSession, Store, StoreError, User, UserSettings, WorkSession};
