//! YouTube channel lookup endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::ApiError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct FindChannelsBody {
    #[serde(default)]
    pub usernames: Vec<String>,
}

pub async fn find_channels(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FindChannelsBody>,
) -> Result<Json<Value>, ApiError> {
    if body.usernames.is_empty() {
        return Err(ApiError::BadRequest("No usernames provided".to_string()));
    }

    let mut channels = Vec::with_capacity(body.usernames.len());
    for username in &body.usernames {
        let username = username.trim();
        if username.is_empty() {
            continue;
        }
        channels.push(state.channels.find_channel(username).await);
    }

    Ok(Json(json!({ "channels": channels })))
}
