//! Main application state management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::info;

use crate::{
    error::AppError,
    services::{Store, StoreError, User, UserSettings},
    tasks::{spawn_timer_session, TimerHandle},
    timer::TimerSettings,
};

/// Server-wide timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDefaults {
    /// Interval length given to new accounts
    pub interval_minutes: u32,
    pub break_seconds: u32,
    pub tick_period: Duration,
}

impl Default for TimerDefaults {
    fn default() -> Self {
        Self {
            interval_minutes: 25,
            break_seconds: 5 * 60,
            tick_period: Duration::from_secs(1),
        }
    }
}

/// State shared by every request handler
pub struct AppState {
    store: Arc<Mutex<Store>>,
    /// One live timer session per signed-in user
    timers: Mutex<HashMap<i64, TimerHandle>>,
    pub defaults: TimerDefaults,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, defaults: TimerDefaults) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            timers: Mutex::new(HashMap::new()),
            defaults,
            start_time: Instant::now(),
        }
    }

    /// Run `f` against the store; the lock is released before returning
    pub fn with_store<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Store) -> Result<T, StoreError>,
    {
        let mut store = self
            .store
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to lock store: {}", e)))?;
        Ok(f(&mut *store)?)
    }

    /// Settings for new accounts
    pub fn default_user_settings(&self) -> UserSettings {
        UserSettings {
            interval_duration_minutes: self.defaults.interval_minutes,
            break_time_counts_in_total: false,
        }
    }

    /// Combine a user's preferences with the server's break length
    pub fn timer_settings(&self, settings: UserSettings) -> TimerSettings {
        TimerSettings {
            interval_minutes: settings.interval_duration_minutes,
            break_seconds: self.defaults.break_seconds,
            break_time_counts: settings.break_time_counts_in_total,
        }
    }

    /// The user's timer session, started on first use
    pub fn timer_for(&self, user: &User) -> Result<TimerHandle, AppError> {
        let mut timers = self
            .timers
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to lock timer registry: {}", e)))?;

        if let Some(handle) = timers.get(&user.id).filter(|h| !h.is_closed()) {
            return Ok(handle.clone());
        }

        info!("Creating timer session for user {}", user.id);
        let handle = spawn_timer_session(
            user.id,
            self.timer_settings(user.settings),
            self.defaults.tick_period,
        );
        timers.insert(user.id, handle.clone());
        Ok(handle)
    }

    /// The user's timer session if one has been started
    pub fn existing_timer(&self, user_id: i64) -> Result<Option<TimerHandle>, AppError> {
        let timers = self
            .timers
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to lock timer registry: {}", e)))?;
        Ok(timers.get(&user_id).filter(|h| !h.is_closed()).cloned())
    }

    /// Take the user's timer out of the registry so the next request starts fresh
    pub fn evict_timer(&self, user_id: i64) -> Result<Option<TimerHandle>, AppError> {
        let mut timers = self
            .timers
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to lock timer registry: {}", e)))?;
        Ok(timers.remove(&user_id))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
