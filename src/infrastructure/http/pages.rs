//! Site pages, health and the script catalog endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, Json, Redirect};
use chrono::Utc;
use serde_json::{json, Value};

use crate::application::errors::ApiError;
use crate::application::services::Script;
use crate::infrastructure::config::SiteConfig;

use super::AppState;

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let meta = meta_tags(
        &state.config.site,
        &format!("{} - Roblox Scripts & Tools", state.config.site.name),
        &format!("{}'s all-in-one website!", state.config.site.name),
        "",
    );
    serve_template(&state, "home.html", Some(&meta)).await
}

pub async fn scripts_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let meta = meta_tags(
        &state.config.site,
        &format!("{} Scripts - Collection", state.config.site.name),
        &format!("Check out our collection of all {} Scripts!", state.config.site.name),
        "/scripts",
    );
    serve_template(&state, "scripts.html", Some(&meta)).await
}

pub async fn plugins_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let meta = meta_tags(
        &state.config.site,
        &format!("{} Plugins - Community", state.config.site.name),
        "Create and share custom bypass plugins!",
        "/plugins",
    );
    serve_template(&state, "plugins.html", Some(&meta)).await
}

pub async fn dashboard_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    serve_template(&state, "dashboard.html", None).await
}

pub async fn discord_invite(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::to(&state.config.site.discord_invite)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn api_scripts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Script>> {
    let search = params.get("search").map(String::as_str).unwrap_or("");
    Json(state.scripts.search(search))
}

async fn serve_template(
    state: &AppState,
    name: &str,
    meta: Option<&str>,
) -> Result<Html<String>, ApiError> {
    let path = state.config.server.templates_dir.join(name);
    let content = tokio::fs::read_to_string(&path).await.map_err(|_| {
        tracing::error!("{} template not found", name);
        ApiError::NotFound("Page not found".to_string())
    })?;

    Ok(Html(match meta {
        Some(tags) => inject_meta_tags(&content, tags),
        None => content,
    }))
}

/// Insert meta tags right after `<head>`; pages without one pass through
fn inject_meta_tags(html: &str, meta_tags: &str) -> String {
    match html.find("<head>") {
        Some(_) => html.replacen("<head>", &format!("<head>\n{}", meta_tags), 1),
        None => html.to_string(),
    }
}

fn meta_tags(site: &SiteConfig, title: &str, description: &str, path: &str) -> String {
    format!(
        concat!(
            "    <meta property=\"og:title\" content=\"{title}\">\n",
            "    <meta property=\"og:description\" content=\"{description}\">\n",
            "    <meta property=\"og:url\" content=\"{base}{path}\">\n",
            "    <meta property=\"og:type\" content=\"website\">\n",
            "    <meta property=\"og:site_name\" content=\"{name}\">\n",
            "    <meta name=\"theme-color\" content=\"{color}\">",
        ),
        title = title,
        description = description,
        base = site.base_url,
        path = path,
        name = site.name,
        color = site.theme_color,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tags_go_after_head() {
        let html = "<html><head><title>x</title></head></html>";
        let out = inject_meta_tags(html, "<meta>");
        assert!(out.starts_with("<html><head>\n<meta>"));
        assert!(out.contains("<title>x</title>"));
    }

    #[test]
    fn headless_html_is_unchanged() {
        let html = "<p>partial</p>";
        assert_eq!(inject_meta_tags(html, "<meta>"), html);
    }
}
