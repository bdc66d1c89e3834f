//! Verification gate endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::ApiError;
use crate::application::services::VerifyOutcome;

use super::{client_ip, AppState};

pub async fn start_verification(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<Value> {
    let ip = client_ip(&headers, &ConnectInfo(addr));
    let token = state.verification.start(&ip);
    Json(json!({
        "token": token,
        "required": state.config.verification.min_seconds,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub token: String,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<VerifyBody>,
) -> Result<Json<Value>, ApiError> {
    if state.verification.captcha_required() {
        let captcha = body
            .captcha_token
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Missing captcha token".to_string()))?;
        if !state.verification.verify_captcha(captcha).await? {
            return Err(ApiError::BadRequest("Captcha verification failed".to_string()));
        }
    }

    let ip = client_ip(&headers, &ConnectInfo(addr));
    let outcome = state.verification.check(&body.token, &ip);
    Ok(Json(match outcome {
        VerifyOutcome::Valid { elapsed } => json!({ "valid": true, "elapsed": elapsed }),
        VerifyOutcome::TimeNotElapsed { elapsed, required } => json!({
            "valid": false,
            "reason": outcome.reason(),
            "elapsed": elapsed,
            "required": required,
        }),
        _ => json!({ "valid": false, "reason": outcome.reason() }),
    }))
}
