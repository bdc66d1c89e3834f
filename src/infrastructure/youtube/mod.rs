//! YouTube channel lookup by username
//!
//! Screen-scrapes public channel pages; YouTube has no key-free API for
//! this. Results are cached because the lookups are slow and the data
//! changes rarely.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

use crate::application::cache::ExpiringMap;

const CACHE_TTL: Duration = Duration::from_secs(7200);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""name":\s*"([^"]+)""#).unwrap());
static OG_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta property="og:title" content="([^"]+)""#).unwrap());
static OG_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta property="og:image" content="([^"]+)""#).unwrap());
static AVATAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""avatar":\{"thumbnails":\[\{"url":"([^"]+)""#).unwrap());
static CHANNEL_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""channelId":"([^"]+)""#).unwrap());

/// Scraped channel metadata
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub name: String,
    pub handle: String,
    pub url: String,
    pub pfp_url: Option<String>,
    pub found: bool,
}

impl ChannelInfo {
    fn not_found(username: &str) -> Self {
        Self {
            name: username.to_string(),
            handle: format!("@{}", username),
            url: format!("https://www.youtube.com/@{}", username),
            pfp_url: None,
            found: false,
        }
    }
}

pub struct ChannelFinder {
    client: reqwest::Client,
    cache: ExpiringMap<String, ChannelInfo>,
}

impl ChannelFinder {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            cache: ExpiringMap::new(CACHE_TTL),
        }
    }

    /// Look up a channel, serving repeats from the cache
    pub async fn find_channel(&self, username: &str) -> ChannelInfo {
        let cache_key = username.trim().to_lowercase();
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        tracing::info!("Fetching channel data for: {}", username);
        let info = match self.try_direct_urls(username).await {
            Some(info) => info,
            None => self
                .search_channel(username)
                .await
                .unwrap_or_else(|| ChannelInfo::not_found(username)),
        };

        if info.found {
            self.cache.insert(cache_key, info.clone());
        }
        info
    }

    /// Probe the three public profile URL shapes in order
    async fn try_direct_urls(&self, username: &str) -> Option<ChannelInfo> {
        let urls = [
            format!("https://www.youtube.com/@{}", username),
            format!("https://www.youtube.com/c/{}", username),
            format!("https://www.youtube.com/user/{}", username),
        ];

        for url in urls {
            match self.fetch(&url).await {
                Ok(html) => return Some(extract_channel_info(&html, &url, username)),
                Err(e) => tracing::debug!("Failed to fetch {}: {}", url, e),
            }
        }
        None
    }

    /// Fall back to the channel-search results page
    async fn search_channel(&self, username: &str) -> Option<ChannelInfo> {
        let search_url = format!(
            "https://www.youtube.com/results?search_query={}&sp=EgIQAg%253D%253D",
            username
        );
        let html = match self.fetch(&search_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Search failed for {}: {}", username, e);
                return None;
            }
        };

        let channel_id = CHANNEL_ID_RE.captures(&html)?.get(1)?.as_str().to_string();
        let channel_url = format!("https://www.youtube.com/channel/{}", channel_id);
        let html = self.fetch(&channel_url).await.ok()?;
        Some(extract_channel_info(&html, &channel_url, username))
    }

    async fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        response.text().await.map_err(|e| e.to_string())
    }
}

impl Default for ChannelFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull title and avatar out of a channel page
fn extract_channel_info(html: &str, url: &str, username: &str) -> ChannelInfo {
    let name = NAME_RE
        .captures(html)
        .or_else(|| OG_TITLE_RE.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| username.to_string());

    let pfp_url = [&*AVATAR_RE, &*OG_IMAGE_RE]
        .iter()
        .filter_map(|re| re.captures(html))
        .filter_map(|c| c.get(1).map(|m| m.as_str().replace("\\u003d", "=")))
        .find(|u| u.contains("yt3.ggpht.com") || u.contains("ytimg.com"));

    ChannelInfo {
        name,
        handle: format!("@{}", username),
        url: url.to_string(),
        pfp_url,
        found: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_from_metadata_json() {
        let html = r#"<html>{"name": "Cool Channel"}</html>"#;
        let info = extract_channel_info(html, "https://www.youtube.com/@cool", "cool");
        assert_eq!(info.name, "Cool Channel");
        assert_eq!(info.handle, "@cool");
        assert!(info.found);
    }

    #[test]
    fn falls_back_to_og_title() {
        let html = r#"<meta property="og:title" content="Other Channel">"#;
        let info = extract_channel_info(html, "https://www.youtube.com/@other", "other");
        assert_eq!(info.name, "Other Channel");
    }

    #[test]
    fn avatar_requires_known_image_host() {
        let html = concat!(
            r#"<meta property="og:image" content="https://yt3.ggpht.com/abc=s176">"#,
        );
        let info = extract_channel_info(html, "u", "u");
        assert_eq!(info.pfp_url.as_deref(), Some("https://yt3.ggpht.com/abc=s176"));

        let bad = r#"<meta property="og:image" content="https://evil.example/a.png">"#;
        assert!(extract_channel_info(bad, "u", "u").pfp_url.is_none());
    }

    #[test]
    fn missing_everything_keeps_username() {
        let info = extract_channel_info("<html></html>", "u", "someuser");
        assert_eq!(info.name, "someuser");
        assert!(info.pfp_url.is_none());
    }
}
