//! HTTP server (axum)

mod analytics;
mod channels;
mod dashboard;
mod keys;
mod media;
mod pages;
mod plugins;
mod verify;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::services::{
    AnalyticsService, DashboardService, KeyService, PluginService, ScriptCatalog,
    VerificationService,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::image::ImageConverter;
use crate::infrastructure::youtube::ChannelFinder;

/// Shared state for all HTTP handlers
pub struct AppState {
    pub config: Config,
    pub plugins: PluginService,
    pub keys: KeyService,
    pub verification: VerificationService,
    pub dashboard: DashboardService,
    pub analytics: AnalyticsService,
    pub scripts: ScriptCatalog,
    pub channels: ChannelFinder,
    pub images: ImageConverter,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(pages::home))
        .route("/scripts", get(pages::scripts_page))
        .route("/plugins", get(pages::plugins_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/discord", get(pages::discord_invite))
        .route("/health", get(pages::health))
        .route("/api/scripts", get(pages::api_scripts))
        // Plugin records
        .route("/api/plugins", get(plugins::list).post(plugins::create))
        .route(
            "/api/plugins/:id",
            get(plugins::fetch).put(plugins::update).delete(plugins::remove),
        )
        // Utilities
        .route("/convert-image", get(media::convert_image))
        .route("/api/find-channels", post(channels::find_channels))
        // Key system
        .route("/create", post(keys::create_slug))
        .route("/getkey/:slug", get(keys::get_key))
        .route("/validate-key", post(keys::validate_key))
        // Verification gate
        .route("/start-verification", post(verify::start_verification))
        .route("/verify", post(verify::verify))
        // Bypass dashboard
        .route("/api/bypass-status/:category", get(dashboard::status))
        .route("/api/bypass-status/:category/start", post(dashboard::start))
        .route(
            "/api/bypass-status/:category/complete",
            post(dashboard::complete),
        )
        .route(
            "/api/bypass-status/:category/cancel",
            post(dashboard::cancel),
        )
        .route("/api/dashboard/stats", get(dashboard::stats))
        // Analytics
        .route("/analytics/log", post(analytics::log))
        .route("/analytics/stats", get(analytics::stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server until shutdown
pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

/// Client address for rate limiting and verification.
///
/// The original deployment sits behind a hosting proxy, so the first
/// X-Forwarded-For hop wins over the socket peer.
pub fn client_ip(headers: &HeaderMap, ConnectInfo(addr): &ConnectInfo<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_info() -> ConnectInfo<SocketAddr> {
        ConnectInfo("10.0.0.1:9999".parse().unwrap())
    }

    #[test]
    fn forwarded_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers, &conn_info()), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_peer_address() {
        assert_eq!(client_ip(&HeaderMap::new(), &conn_info()), "10.0.0.1");
    }
}
