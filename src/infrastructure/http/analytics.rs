//! Execution-log analytics endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::application::errors::ApiError;
use crate::application::services::{AnalyticsStats, ExecutionRecord};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct LogBody {
    pub script: String,
    #[serde(default)]
    pub executor: Option<String>,
}

pub async fn log(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LogBody>,
) -> Result<(StatusCode, Json<ExecutionRecord>), ApiError> {
    if body.script.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing script name".to_string()));
    }
    let executor = body.executor.as_deref().unwrap_or("unknown");
    let record = state.analytics.log(body.script.trim(), executor).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<AnalyticsStats> {
    Json(state.analytics.stats().await)
}
