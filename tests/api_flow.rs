//! End-to-end tests through the HTTP router.
//!
//! Timing tests run on a paused tokio clock, so sleeping N seconds delivers
//! exactly N engine ticks.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::time::sleep;
use tower::ServiceExt;

use focus_timer::{api::create_router, services::Store, AppState, TimerDefaults};

fn app_with(defaults: TimerDefaults) -> Router {
    let store = Store::open_in_memory().unwrap();
    create_router(Arc::new(AppState::new(store, defaults)))
}

/// One-minute intervals and 30 second breaks
fn short_app() -> Router {
    app_with(TimerDefaults {
        interval_minutes: 1,
        break_seconds: 30,
        tick_period: Duration::from_secs(1),
    })
}

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        set_cookie,
        body,
    }
}

async fn join(app: &Router, email: &str) -> String {
    let reply = send(app, Method::POST, "/join", None, Some(json!({ "email": email }))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.body["token"].as_str().unwrap().to_string()
}

async fn dispatch(app: &Router, token: &str, event: &str) -> Reply {
    send(
        app,
        Method::POST,
        "/timer/events",
        Some(token),
        Some(json!({ "type": event })),
    )
    .await
}

#[tokio::test]
async fn health_reports_ok() {
    let app = short_app();
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let app = short_app();
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/timer/events")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn timer_requires_sign_in() {
    let app = short_app();
    let reply = send(&app, Method::GET, "/timer", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = send(&app, Method::GET, "/timer", Some("not-a-token"), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = send(&app, Method::POST, "/profile/settings", None, Some(json!({}))).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn join_login_logout() {
    let app = short_app();
    let reply = send(&app, Method::POST, "/join", None, Some(json!({ "email": "Ada@Example.com" }))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["user"]["email"], "ada@example.com");
    let cookie = reply.set_cookie.unwrap();
    assert!(cookie.starts_with("focus_timer_session="));

    let again = send(&app, Method::POST, "/join", None, Some(json!({ "email": "ada@example.com" }))).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let unknown = send(&app, Method::POST, "/login", None, Some(json!({ "email": "bob@example.com" }))).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let invalid = send(&app, Method::POST, "/login", None, Some(json!({ "email": "nope" }))).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert!(invalid.body["errors"]["email"].is_string());

    let login = send(&app, Method::POST, "/login", None, Some(json!({ "email": "ada@example.com" }))).await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["token"].as_str().unwrap().to_string();

    let logout = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let after = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_authenticates_requests() {
    let app = short_app();
    let reply = send(&app, Method::POST, "/join", None, Some(json!({ "email": "ada@example.com" }))).await;
    let cookie = reply.set_cookie.unwrap();
    let pair = cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/timer")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn pause_from_ready_is_ignored() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    let before = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(before.body["phase"], "READY");
    assert_eq!(before.body["display"], "01:00");

    let reply = dispatch(&app, &token, "PAUSED").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["changed"], false);
    assert_eq!(reply.body["timer"], before.body);
}

#[tokio::test]
async fn unknown_events_are_no_ops() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;
    let reply = dispatch(&app, &token, "SNOOZE").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["changed"], false);
    assert_eq!(reply.body["timer"]["phase"], "READY");
}

#[tokio::test(start_paused = true)]
async fn one_minute_cycle_records_work_time_only() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    dispatch(&app, &token, "READY").await;
    let started = dispatch(&app, &token, "WORKING").await;
    assert_eq!(started.body["timer"]["phase"], "WORKING");

    sleep(Duration::from_millis(60_500)).await;
    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "BREAKING");
    assert_eq!(timer.body["display"], "00:30");
    assert_eq!(timer.body["elapsed_seconds"], 60);

    sleep(Duration::from_secs(10)).await;
    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["elapsed_seconds"], 60);

    let stopped = send(
        &app,
        Method::POST,
        "/timer/events",
        Some(&token),
        Some(json!({ "type": "STOPPED", "writing": "outlined the talk" })),
    )
    .await;
    assert_eq!(stopped.status, StatusCode::OK);
    assert_eq!(stopped.body["timer"]["phase"], "READY");
    assert_eq!(stopped.body["session"]["duration_seconds"], 60);
    assert_eq!(stopped.body["session"]["completed_cycles"], 0);
    assert_eq!(stopped.body["session"]["writing"], "outlined the talk");

    let sessions = send(&app, Method::GET, "/sessions", Some(&token), None).await;
    assert_eq!(sessions.body["sessions"].as_array().unwrap().len(), 1);

    let profile = send(&app, Method::GET, "/profile", Some(&token), None).await;
    assert_eq!(profile.body["total_seconds"], 60);
    assert_eq!(profile.body["week_seconds"], 60);
    assert_eq!(profile.body["session_count"], 1);
}

#[tokio::test(start_paused = true)]
async fn counted_breaks_extend_the_total() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;
    let reply = send(
        &app,
        Method::POST,
        "/profile/settings",
        Some(&token),
        Some(json!({ "intervalDurationMinutes": 1, "breakTimeCountsInTotal": true })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    dispatch(&app, &token, "WORKING").await;
    sleep(Duration::from_millis(70_500)).await;
    let stopped = dispatch(&app, &token, "STOPPED").await;
    assert_eq!(stopped.body["session"]["duration_seconds"], 70);
}

#[tokio::test(start_paused = true)]
async fn counting_breaks_mid_break_applies_to_remaining_ticks() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    dispatch(&app, &token, "WORKING").await;
    sleep(Duration::from_millis(60_500)).await;
    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "BREAKING");

    let reply = send(
        &app,
        Method::POST,
        "/profile/settings",
        Some(&token),
        Some(json!({ "intervalDurationMinutes": 1, "breakTimeCountsInTotal": true })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    sleep(Duration::from_secs(10)).await;
    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "BREAKING");
    assert_eq!(timer.body["elapsed_seconds"], 70);
    assert_eq!(timer.body["settings"]["breakTimeCounts"], true);

    let stopped = dispatch(&app, &token, "STOPPED").await;
    assert_eq!(stopped.body["session"]["duration_seconds"], 70);
}

#[tokio::test(start_paused = true)]
async fn logout_ends_the_running_timer() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    dispatch(&app, &token, "WORKING").await;
    sleep(Duration::from_millis(5_500)).await;
    let logout = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let login = send(&app, Method::POST, "/login", None, Some(json!({ "email": "ada@example.com" }))).await;
    let token = login.body["token"].as_str().unwrap().to_string();
    sleep(Duration::from_secs(3)).await;

    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "READY");
    assert_eq!(timer.body["display"], "01:00");
    assert_eq!(timer.body["elapsed_seconds"], 0);
}

#[tokio::test(start_paused = true)]
async fn paused_time_is_not_recorded() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    dispatch(&app, &token, "WORKING").await;
    sleep(Duration::from_millis(5_500)).await;
    dispatch(&app, &token, "PAUSED").await;
    sleep(Duration::from_secs(5)).await;
    dispatch(&app, &token, "WORKING").await;
    sleep(Duration::from_millis(2_500)).await;

    let stopped = dispatch(&app, &token, "STOPPED").await;
    assert_eq!(stopped.body["session"]["duration_seconds"], 7);
}

#[tokio::test]
async fn stopping_without_counted_time_fails_but_resets() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;
    dispatch(&app, &token, "WORKING").await;

    let stopped = dispatch(&app, &token, "STOPPED").await;
    assert_eq!(stopped.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stopped.body["error"], "duration cannot be 0");

    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "READY");
    let sessions = send(&app, Method::GET, "/sessions", Some(&token), None).await;
    assert!(sessions.body["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_writing_is_rejected_before_the_timer() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;
    dispatch(&app, &token, "WORKING").await;

    let reply = send(
        &app,
        Method::POST,
        "/timer/events",
        Some(&token),
        Some(json!({ "type": "STOPPED", "writing": "   " })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["errors"]["writing"].is_string());

    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["phase"], "WORKING");
}

#[tokio::test]
async fn settings_are_validated_and_resize_a_ready_timer() {
    let app = short_app();
    let token = join(&app, "ada@example.com").await;

    let missing = send(&app, Method::POST, "/profile/settings", Some(&token), Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body["errors"]["intervalDurationMinutes"],
        "Must provide an interval duration"
    );

    let negative = send(
        &app,
        Method::POST,
        "/profile/settings",
        Some(&token),
        Some(json!({ "intervalDurationMinutes": -5 })),
    )
    .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        negative.body["errors"]["intervalDurationMinutes"],
        "Interval duration must be a positive number"
    );

    for bad in [json!("abc"), json!(2.5), json!(true), json!(5_000_000_000u64)] {
        let reply = send(
            &app,
            Method::POST,
            "/profile/settings",
            Some(&token),
            Some(json!({ "intervalDurationMinutes": bad })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{bad}");
        assert!(reply.body["errors"]["intervalDurationMinutes"].is_string(), "{bad}");
    }

    let numeric_text = send(
        &app,
        Method::POST,
        "/profile/settings",
        Some(&token),
        Some(json!({ "intervalDurationMinutes": "30" })),
    )
    .await;
    assert_eq!(numeric_text.status, StatusCode::OK);
    assert_eq!(numeric_text.body["settings"]["intervalDurationMinutes"], 30);

    // start the timer session so the update has a live timer to reach
    send(&app, Method::GET, "/timer", Some(&token), None).await;
    let updated = send(
        &app,
        Method::POST,
        "/profile/settings",
        Some(&token),
        Some(json!({ "intervalDurationMinutes": 50 })),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["settings"]["intervalDurationMinutes"], 50);
    assert_eq!(updated.body["settings"]["breakTimeCountsInTotal"], false);

    let timer = send(&app, Method::GET, "/timer", Some(&token), None).await;
    assert_eq!(timer.body["display"], "50:00");
    assert_eq!(timer.body["settings"]["intervalMinutes"], 50);
    assert_eq!(timer.body["settings"]["breakTimeCounts"], false);

    let profile = send(&app, Method::GET, "/profile", Some(&token), None).await;
    assert_eq!(profile.body["settings"]["intervalDurationMinutes"], 50);
}
