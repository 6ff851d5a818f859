//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    services::{User, WorkSession},
    timer::TimerSnapshot,
};

/// Body of `/join` and `/login`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountRequest {
    pub email: String,
}

/// Body of `/timer/events`
#[derive(Debug, Clone, Deserialize)]
pub struct TimerEventRequest {
    /// One of READY, WORKING, PAUSED, BREAKING, STOPPED
    #[serde(rename = "type")]
    pub event: String,
    /// Free text saved with the session when stopping
    #[serde(default)]
    pub writing: Option<String>,
}

/// Body of `/profile/settings`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    /// Raw JSON so malformed values still get a field-level error
    #[serde(default)]
    pub interval_duration_minutes: Option<Value>,
    #[serde(default)]
    pub break_time_counts_in_total: Option<bool>,
}

/// Returned after joining or logging in
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Result of dispatching a timer event
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub changed: bool,
    pub timer: TimerSnapshot,
    /// Present when the event stopped and recorded a session
    pub session: Option<WorkSession>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<WorkSession>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
}

impl HealthResponse {
    pub fn ok(uptime: String) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
        }
    }
}
