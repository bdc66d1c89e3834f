//! Image conversion endpoint

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::response::Json;
use serde_json::{json, Value};

use crate::application::errors::ApiError;

use super::AppState;

pub async fn convert_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let url = params
        .get("url")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No URL provided in query parameters".to_string()))?;
    let crop = params
        .get("crop")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true);

    let start = Instant::now();
    let conversion = state.images.convert_url(url, crop).await?;

    Ok(Json(json!({
        "pixels": conversion.pixels,
        "processing_time": start.elapsed().as_secs_f64(),
        "original_size": conversion.original_size,
        "final_size": conversion.final_size,
        "resize_method": conversion.resize_method,
        "crop_mode": crop,
    })))
}
