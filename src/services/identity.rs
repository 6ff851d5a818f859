//! Identity: auth tokens, the signed-in user and their settings

use axum::http::{header, HeaderMap};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    services::store::{User, UserSettings},
    state::AppState,
};

/// Cookie carrying the auth token
pub const AUTH_COOKIE: &str = "focus_timer_session";

/// Extract the auth token from the cookie or a bearer header
pub fn auth_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, token)| token.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
    .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value establishing a signed-in session
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", AUTH_COOKIE, token)
}

/// `Set-Cookie` value clearing the session
pub fn cleared_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", AUTH_COOKIE)
}

/// The signed-in user, if the request carries a valid token
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, AppError> {
    let Some(token) = auth_token(headers) else {
        return Ok(None);
    };
    let user = state.with_store(|store| store.user_for_token(&token))?;
    if user.is_none() {
        debug!("Request carried an unknown auth token");
    }
    Ok(user)
}

/// The signed-in user, or `Unauthorized`
pub fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    current_user(state, headers)?.ok_or(AppError::Unauthorized)
}

/// Persist new settings and hand them to the user's live timer
pub async fn update_user_settings(
    state: &AppState,
    user: &User,
    settings: UserSettings,
) -> Result<User, AppError> {
    let updated = state.with_store(|store| store.update_user_settings(user.id, settings))?;
    info!("User {} updated settings: {:?}", user.id, settings);

    if let Some(timer) = state.existing_timer(user.id)? {
        if let Err(e) = timer.update_settings(state.timer_settings(settings)).await {
            warn!("Failed to push settings to live timer: {}", e);
        }
    }

    Ok(updated)
}
