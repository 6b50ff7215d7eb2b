//! Bridge operation handlers

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use crate::config::{BridgeConfig, BridgeConfigUpdate};
use crate::discovery::FileScan;
use crate::measurement::{Measurement, MeasurementKind};
use crate::state::{BridgeStatus, ConnectResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MeasurementQuery {
    /// Measurement kind; spectrum when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Return headers only, without point data
    #[serde(default)]
    pub summary: bool,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<BridgeStatus> {
    Json(state.bridge.get_status().await)
}

/// POST /api/connect
pub async fn connect(State(state): State<AppState>) -> Json<ConnectResponse> {
    Json(state.bridge.connect().await)
}

/// GET /api/measurement?type=spectrum
pub async fn get_measurement(
    State(state): State<AppState>,
    Query(query): Query<MeasurementQuery>,
) -> Result<Response, ApiError> {
    let kind = match query.kind.as_deref() {
        Some(name) => name.parse::<MeasurementKind>()?,
        None => MeasurementKind::Spectrum,
    };
    let measurement = state.bridge.get_measurement(kind).await?;
    Ok(Json(measurement.as_ref()).into_response())
}

/// GET /api/synthesize/:kind
pub async fn synthesize(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Measurement>, ApiError> {
    let kind: MeasurementKind = kind.parse()?;
    Ok(Json(state.bridge.synthesize(kind).await?))
}

/// GET /api/alignment
pub async fn get_alignment(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.bridge.get_alignment_report().await?;
    Ok(Json(snapshot).into_response())
}

/// GET /api/history[?summary=true]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    if query.summary {
        return Json(state.bridge.history_summaries().await).into_response();
    }
    let history = state.bridge.list_history().await;
    let entries: Vec<&Measurement> = history.iter().map(|m| m.as_ref()).collect();
    Json(entries).into_response()
}

/// GET /api/history/:id
pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid measurement id '{}'", id)))?;
    let measurement = state.bridge.get_history_entry(id).await?;
    Ok(Json(measurement.as_ref()).into_response())
}

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> Json<FileScan> {
    Json(state.bridge.list_candidate_files().await)
}

/// POST /api/config
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<BridgeConfigUpdate>,
) -> Result<Json<BridgeConfig>, ApiError> {
    Ok(Json(state.bridge.update_config(&update).await?))
}
