//! Bypass dashboard endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::ApiError;
use crate::application::services::{DashboardStats, StartOutcome};

use super::AppState;

pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Value> {
    let view = state.dashboard.status(&category);
    Json(serde_json::to_value(view).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct StartBody {
    pub player_id: String,
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Json(body): Json<StartBody>,
) -> Json<StartOutcome> {
    Json(state.dashboard.start_test(&category, &body.player_id))
}

#[derive(Debug, Deserialize)]
pub struct CompleteBody {
    pub success_rate: u32,
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Json(body): Json<CompleteBody>,
) -> Result<Json<Value>, ApiError> {
    let view = state
        .dashboard
        .complete_test(&category, body.success_rate)
        .map_err(ApiError::NotFound)?;
    Ok(Json(json!({
        "success": true,
        "success_rate": view.success_rate,
    })))
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .dashboard
        .cancel_test(&category)
        .map_err(ApiError::NotFound)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    Json(state.dashboard.stats())
}
