//! Profile totals over a user's work sessions

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;

use super::store::{Store, StoreError, User, UserSettings};

/// Aggregate view shown on the profile page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileReport {
    pub email: String,
    pub total_seconds: u64,
    pub session_count: usize,
    pub week_started_at: DateTime<Utc>,
    pub week_seconds: u64,
    pub settings: UserSettings,
}

/// Start of the week containing `now`: Monday 00:00 UTC
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_since_monday);
    monday.and_time(NaiveTime::MIN).and_utc()
}

pub fn profile_report(store: &Store, user: &User, now: DateTime<Utc>) -> Result<ProfileReport, StoreError> {
    let sessions = store.list_sessions(user.id)?;
    let week_started_at = week_start(now);
    let this_week = store.list_sessions_since(user.id, week_started_at)?;

    Ok(ProfileReport {
        email: user.email.clone(),
        total_seconds: sessions.iter().map(|s| s.duration_seconds).sum(),
        session_count: sessions.len(),
        week_started_at,
        week_seconds: this_week.iter().map(|s| s.duration_seconds).sum(),
        settings: user.settings,
    })
}
