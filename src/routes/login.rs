use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::HubError;
use crate::session;
use crate::state::AppState;
use crate::timezone;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct TimezoneBody {
    timezone: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(api_session))
        .route("/api/session/timezone", post(api_session_timezone))
        .route("/api/login", post(api_login))
        .route("/api/logout", post(api_logout))
}

/// What the frontend needs to decide between login form and dashboard.
async fn api_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Value> {
    let session =
        session::session_id_from_headers(&headers).and_then(|id| state.sessions.get(&id));

    Json(json!({
        "auth_required": state.auth_required(),
        "authenticated": session.as_ref().map(|s| s.authenticated).unwrap_or(false),
        "timezone": session.as_ref().and_then(|s| s.timezone.clone()),
    }))
}

/// Record the browser-reported IANA zone on the session, minting the session
/// if the browser has none yet.  Called once per page load, before login.
async fn api_session_timezone(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TimezoneBody>,
) -> Result<impl IntoResponse, HubError> {
    let zone = timezone::parse_zone(&body.timezone)
        .ok_or_else(|| HubError::BadRequest(format!("unknown timezone: {}", body.timezone)))?;

    let id = existing_session_id(&state, &headers).unwrap_or_else(|| state.sessions.create());
    state
        .sessions
        .update(&id, |s| s.timezone = Some(zone.name().to_string()));

    Ok((
        [(header::SET_COOKIE, session::set_cookie_value(&id))],
        Json(json!({ "ok": true, "timezone": zone.name() })),
    ))
}

async fn api_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Result<Response, HubError> {
    if !state.auth_required() {
        return Ok(Json(json!({ "ok": true, "auth_required": false })).into_response());
    }

    if !state.verifier.verify(&body.username, &body.password) {
        return Err(HubError::Unauthorized);
    }

    // Upgrade the existing session when there is one, so a zone reported
    // before login survives it.
    let id = existing_session_id(&state, &headers).unwrap_or_else(|| state.sessions.create());
    state.sessions.update(&id, |s| s.authenticated = true);

    Ok((
        [(header::SET_COOKIE, session::set_cookie_value(&id))],
        Json(json!({ "ok": true, "username": body.username })),
    )
        .into_response())
}

/// Drop the whole session record and expire the cookie.  One step clears
/// the auth flag and everything else the session carried.
async fn api_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(id) = session::session_id_from_headers(&headers) {
        state.sessions.remove(&id);
    }

    (
        [(header::SET_COOKIE, session::clear_cookie_value())],
        Json(json!({ "ok": true })),
    )
}

fn existing_session_id(state: &AppState, headers: &HeaderMap) -> Option<String> {
    session::session_id_from_headers(headers).filter(|id| state.sessions.get(id).is_some())
}
