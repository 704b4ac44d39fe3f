use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assets;
use crate::error::HubError;
use crate::report;
use crate::speech::SpeechError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClipQuery {
    asset: String,
    #[serde(default)]
    reload: bool,
}

#[derive(Debug, Deserialize)]
pub struct SpeakBody {
    asset: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/speech/clip", get(api_speech_clip))
        .route("/api/speech/status", get(api_speech_status))
        .route("/api/speech/start", post(api_speech_start))
        .route("/api/speech/stop", post(api_speech_stop))
}

/// Synthesize the current report as a one-shot WAV clip for in-browser
/// playback.  Nothing is kept server-side once the bytes are sent.
async fn api_speech_clip(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ClipQuery>,
) -> Result<impl IntoResponse, HubError> {
    let (_, text) = current_report(&state, &q.asset, q.reload).await?;

    let bytes = state
        .speaker
        .synthesize_clip(&text)
        .await
        .map_err(|e| HubError::Speech(format!("{e:#}")))?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], bytes))
}

async fn api_speech_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "speaking": state.speaker.is_speaking().await }))
}

/// Start speaking the report on the host audio device.  Refused with 409
/// while a previous utterance is still playing.
async fn api_speech_start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeakBody>,
) -> Result<Json<Value>, HubError> {
    let (_, text) = current_report(&state, &body.asset, false).await?;

    match state.speaker.start(&text).await {
        Ok(()) => Ok(Json(json!({ "ok": true, "speaking": true, "text": text }))),
        Err(SpeechError::AlreadySpeaking) => Err(HubError::Conflict(
            "already speaking; stop the current report first".to_string(),
        )),
        Err(SpeechError::Engine(msg)) => Err(HubError::Speech(msg)),
    }
}

async fn api_speech_stop(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.speaker.stop().await;
    Json(json!({ "ok": true, "speaking": false }))
}

async fn current_report(
    state: &AppState,
    asset_id: &str,
    reload: bool,
) -> Result<(&'static assets::Asset, String), HubError> {
    let asset = assets::find(asset_id)
        .ok_or_else(|| HubError::NotFound(format!("unknown asset: {asset_id}")))?;

    let fetched = state.market.quotes(&assets::ids(), reload).await;
    if let Some(err) = fetched.error {
        return Err(HubError::Upstream(err));
    }

    let quote = fetched.value.get(asset.id).copied().unwrap_or_default();
    Ok((asset, report::report_text(asset, &quote)))
}
