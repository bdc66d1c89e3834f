//! Plugin record endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde_json::{json, Value};

use crate::application::errors::ApiError;
use crate::domain::entities::{Plugin, PluginDraft};

use super::{client_ip, AppState};

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Plugin>>, ApiError> {
    Ok(Json(state.plugins.list().await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(draft): Json<PluginDraft>,
) -> Result<(StatusCode, Json<Plugin>), ApiError> {
    let ip = client_ip(&headers, &ConnectInfo(addr));
    let plugin = state.plugins.create(&ip, &draft).await?;
    Ok((StatusCode::CREATED, Json(plugin)))
}

pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Plugin>, ApiError> {
    Ok(Json(state.plugins.fetch(&id).await?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<PluginDraft>,
) -> Result<Json<Plugin>, ApiError> {
    Ok(Json(state.plugins.update(&id, &draft).await?))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.plugins.remove(&id).await?;
    Ok(Json(json!({ "message": "Plugin deleted successfully" })))
}
