//! Key system endpoints: slug creation and one-shot key retrieval

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::ApiError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSlugBody {
    pub hwid: String,
}

pub async fn create_slug(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSlugBody>,
) -> Result<Json<Value>, ApiError> {
    if body.hwid.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing hwid".to_string()));
    }
    let slug = state.keys.create_slug(body.hwid.trim());
    Ok(Json(json!({ "slug": slug })))
}

pub async fn get_key(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.keys.redeem_slug(&slug) {
        Some(key) => Ok(Json(json!({ "key": key }))),
        None => Err(ApiError::NotFound("Invalid or expired slug".to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateKeyBody {
    pub hwid: String,
    pub key: String,
}

pub async fn validate_key(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateKeyBody>,
) -> Json<Value> {
    let valid = state.keys.validate_key(body.hwid.trim(), &body.key);
    Json(json!({ "valid": valid }))
}
