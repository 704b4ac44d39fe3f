use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::assets;
use crate::chart::{self, ChartMode};
use crate::error::HubError;
use crate::report;
use crate::session;
use crate::state::AppState;
use crate::timezone;

const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 420;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ── Query params ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    asset: String,
    #[serde(default)]
    reload: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    asset: String,
    #[serde(default)]
    days: Option<u32>,
    #[serde(default)]
    tz: Option<String>,
    #[serde(default)]
    reload: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    asset: String,
    #[serde(default)]
    days: Option<u32>,
    #[serde(default)]
    tz: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    reload: bool,
}

// ── Route definitions ────────────────────────────────────────────────────

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/assets", get(api_assets))
        .route("/api/report", get(api_report))
        .route("/api/history", get(api_history))
        .route("/api/chart.svg", get(api_chart))
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn api_assets(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "assets": assets::ASSETS,
        "default": assets::ASSETS[0].id,
        "auth_required": state.auth_required(),
    }))
}

async fn api_report(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<Value>, HubError> {
    let asset = lookup_asset(&q.asset)?;

    let fetched = state.market.quotes(&assets::ids(), q.reload).await;
    let quote = fetched.value.get(asset.id).copied().unwrap_or_default();

    Ok(Json(json!({
        "asset": asset,
        "metrics": report::metrics(&quote),
        "report": report::report_text(asset, &quote),
        "error": fetched.error,
        "now_ts_ms": now_ms(),
    })))
}

async fn api_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Value>, HubError> {
    let asset = lookup_asset(&q.asset)?;
    let days = resolve_days(&state, q.days);
    let tz = resolve_zone(&state, &headers, q.tz.as_deref());

    let fetched = state.market.history(asset.id, days, q.reload).await;

    let points: Vec<Value> = fetched
        .value
        .iter()
        .map(|p| {
            json!({
                "ts_ms": p.ts_ms,
                "time": timezone::format_in_zone(p.ts_ms, tz),
                "price": p.price,
            })
        })
        .collect();

    Ok(Json(json!({
        "asset": asset.id,
        "days": days,
        "timezone": tz.name(),
        "points": points,
        "error": fetched.error,
        "now_ts_ms": now_ms(),
    })))
}

async fn api_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<ChartQuery>,
) -> Result<impl IntoResponse, HubError> {
    let asset = lookup_asset(&q.asset)?;
    let days = resolve_days(&state, q.days);
    let tz = resolve_zone(&state, &headers, q.tz.as_deref());

    let mode = match &q.mode {
        Some(raw) => ChartMode::parse(raw)
            .ok_or_else(|| HubError::BadRequest(format!("unknown chart mode: {raw}")))?,
        None => ChartMode::parse(&state.config.chart_mode).unwrap_or(ChartMode::UpDown),
    };

    let fetched = state.market.history(asset.id, days, q.reload).await;
    if let Some(err) = fetched.error {
        return Err(HubError::Upstream(err));
    }

    let points: Vec<(NaiveDateTime, f64)> = fetched
        .value
        .iter()
        .map(|p| (timezone::to_zone_naive(p.ts_ms, tz), p.price))
        .collect();

    let caption = if days == 1 {
        format!("{} Price Movement (Last 24 Hours)", asset.name)
    } else {
        format!("{} Price Movement (Last {days} Days)", asset.name)
    };

    let svg = chart::render_svg(&points, &caption, mode, CHART_WIDTH, CHART_HEIGHT)
        .map_err(HubError::Upstream)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn lookup_asset(id: &str) -> Result<&'static assets::Asset, HubError> {
    assets::find(id).ok_or_else(|| HubError::NotFound(format!("unknown asset: {id}")))
}

fn resolve_days(state: &AppState, requested: Option<u32>) -> u32 {
    requested.unwrap_or(state.config.history_window_days).clamp(1, 365)
}

/// Display zone precedence: explicit query param, then the zone the session
/// reported, then the configured fallback.  A valid explicit param is also
/// remembered on the session so later plain requests keep using it.
fn resolve_zone(state: &AppState, headers: &HeaderMap, explicit: Option<&str>) -> chrono_tz::Tz {
    let session_id = session::session_id_from_headers(headers);

    if let (Some(id), Some(zone)) = (&session_id, explicit.and_then(timezone::parse_zone)) {
        state
            .sessions
            .update(id, |s| s.timezone = Some(zone.name().to_string()));
    }

    let session_zone = session_id
        .and_then(|id| state.sessions.get(&id))
        .and_then(|s| s.timezone);

    timezone::resolve_display_zone(explicit, session_zone.as_deref(), &state.config.fallback_zone)
}
