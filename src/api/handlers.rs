//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    error::AppError,
    services::{
        identity::{auth_token, cleared_cookie, session_cookie},
        profile_report, require_user, update_user_settings, NewWorkSession, ProfileReport, User,
        UserSettings, WorkSession,
    },
    state::AppState,
    timer::{Submission, TimerEvent, TimerSnapshot},
};
use super::responses::{
    AccountRequest, AuthResponse, DispatchResponse, HealthResponse, SessionsResponse,
    SettingsRequest, TimerEventRequest,
};

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("email", "Email is invalid"));
    }
    Ok(email.to_lowercase())
}

fn signed_in(user: User, token: String, status: StatusCode) -> impl IntoResponse {
    let cookie = session_cookie(&token);
    (status, [(header::SET_COOKIE, cookie)], Json(AuthResponse { user, token }))
}

/// Handle POST /join - Create an account and sign it in
pub async fn join_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = validate_email(&request.email)?;
    let settings = state.default_user_settings();
    let (user, token) = state.with_store(|store| {
        let user = store.create_user(&email, settings)?;
        let token = store.create_auth_token(user.id)?;
        Ok((user, token))
    })?;

    info!("Join endpoint called - user {} created", user.id);
    Ok(signed_in(user, token, StatusCode::CREATED))
}

/// Handle POST /login - Sign in an existing account
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = validate_email(&request.email)?;
    let signed = state.with_store(|store| {
        let Some(user) = store.find_user_by_email(&email)? else {
            return Ok(None);
        };
        let token = store.create_auth_token(user.id)?;
        Ok(Some((user, token)))
    })?;
    let (user, token) = signed.ok_or(AppError::UnknownAccount(email))?;

    info!("Login endpoint called - user {} signed in", user.id);
    Ok(signed_in(user, token, StatusCode::OK))
}

/// Handle POST /logout - Revoke the current token and end the user's timer
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = auth_token(&headers) {
        let (user, revoked) = state.with_store(|store| {
            let user = store.user_for_token(&token)?;
            Ok((user, store.delete_auth_token(&token)?))
        })?;
        debug!("Logout endpoint called - token revoked: {}", revoked);

        if let Some(user) = user {
            if let Some(timer) = state.evict_timer(user.id)? {
                // already gone is fine
                if timer.close().await.is_ok() {
                    info!("Closed timer session for user {}", user.id);
                }
            }
        }
    }
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cleared_cookie())]))
}

/// Handle GET /timer - Current phase, countdown and legal actions
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TimerSnapshot>, AppError> {
    let user = require_user(&state, &headers)?;
    let timer = state.timer_for(&user)?;
    Ok(Json(timer.snapshot().await?))
}

/// Handle POST /timer/events - Dispatch an event to the user's timer
pub async fn timer_event_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TimerEventRequest>,
) -> Result<Json<DispatchResponse>, AppError> {
    let user = require_user(&state, &headers)?;

    let writing = match request.writing {
        Some(text) if text.trim().is_empty() => {
            return Err(AppError::validation(
                "writing",
                "Writing must contain at least 1 character",
            ));
        }
        other => other,
    };

    let timer = state.timer_for(&user)?;
    let event = match request.event.parse::<TimerEvent>() {
        Ok(event) => event,
        Err(e) => {
            debug!("Ignoring {} for user {}", e, user.id);
            return Ok(Json(DispatchResponse {
                changed: false,
                timer: timer.snapshot().await?,
                session: None,
            }));
        }
    };

    let reply = timer.dispatch(event).await?;
    let session = match reply.outcome.submission {
        Some(submission) => {
            let saved = spawn_submission(state.clone(), user.id, submission, writing)
                .await
                .map_err(|e| AppError::Internal(format!("Session writer failed: {}", e)))??;
            Some(saved)
        }
        None => None,
    };

    Ok(Json(DispatchResponse {
        changed: reply.outcome.changed,
        timer: reply.snapshot,
        session,
    }))
}

/// Persist a stopped session on its own task
///
/// The timer has already reset, so the write runs to completion even if the
/// caller stops waiting for it.
pub(crate) fn spawn_submission(
    state: Arc<AppState>,
    user_id: i64,
    submission: Submission,
    writing: Option<String>,
) -> JoinHandle<Result<WorkSession, AppError>> {
    tokio::task::spawn_blocking(move || record_submission(&state, user_id, submission, writing))
}

fn record_submission(
    state: &AppState,
    user_id: i64,
    submission: Submission,
    writing: Option<String>,
) -> Result<WorkSession, AppError> {
    if submission.duration_seconds == 0 {
        return Err(AppError::EmptyDuration);
    }

    let session = state.with_store(|store| {
        store.create_session(NewWorkSession {
            user_id,
            duration_seconds: submission.duration_seconds,
            completed_cycles: submission.completed_cycles,
            writing,
        })
    })?;
    info!(
        "Recorded {}s work session {} for user {}",
        session.duration_seconds, session.id, user_id
    );
    Ok(session)
}

/// Handle GET /sessions - All recorded sessions, longest first
pub async fn sessions_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionsResponse>, AppError> {
    let user = require_user(&state, &headers)?;
    let sessions = state.with_store(|store| store.list_sessions(user.id))?;
    Ok(Json(SessionsResponse { sessions }))
}

/// Handle GET /profile - Totals and current settings
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProfileReport>, AppError> {
    let user = require_user(&state, &headers)?;
    let report = state.with_store(|store| profile_report(store, &user, Utc::now()))?;
    Ok(Json(report))
}

/// Interval minutes must be a positive whole number, given as a number or numeric string
fn parse_interval(value: Option<&Value>) -> Result<u32, AppError> {
    const FIELD: &str = "intervalDurationMinutes";

    let minutes = match value {
        None | Some(Value::Null) => {
            return Err(AppError::validation(FIELD, "Must provide an interval duration"))
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match minutes {
        Some(m) if m.is_finite() && m > 0.0 && m.fract() == 0.0 => {
            if m > f64::from(u32::MAX) {
                Err(AppError::validation(FIELD, "Interval duration is too large"))
            } else {
                Ok(m as u32)
            }
        }
        Some(m) if m.is_finite() && m > 0.0 => Err(AppError::validation(
            FIELD,
            "Interval duration must be a whole number of minutes",
        )),
        _ => Err(AppError::validation(
            FIELD,
            "Interval duration must be a positive number",
        )),
    }
}

/// Handle POST /profile/settings - Change interval length and break policy
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<User>, AppError> {
    let user = require_user(&state, &headers)?;

    let interval = parse_interval(request.interval_duration_minutes.as_ref())?;

    let settings = UserSettings {
        interval_duration_minutes: interval,
        break_time_counts_in_total: request
            .break_time_counts_in_total
            .unwrap_or(user.settings.break_time_counts_in_total),
    };
    let updated = update_user_settings(&state, &user, settings).await?;
    Ok(Json(updated))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime()))
}
