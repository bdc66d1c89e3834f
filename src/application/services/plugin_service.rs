//! Plugin CRUD with per-IP creation rate limiting

use std::sync::Arc;
use std::time::Duration;

use crate::application::cache::ExpiringMap;
use crate::application::errors::ApiError;
use crate::domain::entities::{Plugin, PluginDraft};
use crate::domain::traits::PluginStore;

/// Listing cap for `GET /api/plugins`
const LIST_LIMIT: usize = 50;

/// Creations allowed per IP inside one window
const CREATE_LIMIT: u32 = 2;
const CREATE_WINDOW: Duration = Duration::from_secs(300);

pub struct PluginService {
    store: Arc<dyn PluginStore>,
    create_counts: ExpiringMap<String, u32>,
    create_window: Duration,
}

impl PluginService {
    pub fn new(store: Arc<dyn PluginStore>) -> Self {
        Self::with_create_window(store, CREATE_WINDOW)
    }

    fn with_create_window(store: Arc<dyn PluginStore>, window: Duration) -> Self {
        Self {
            store,
            create_counts: ExpiringMap::new(window),
            create_window: window,
        }
    }

    /// Newest plugins first, capped at 50 records
    pub async fn list(&self) -> Result<Vec<Plugin>, ApiError> {
        let mut plugins = self.store.all().await?;
        plugins.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plugins.truncate(LIST_LIMIT);
        Ok(plugins)
    }

    pub async fn create(&self, client_ip: &str, draft: &PluginDraft) -> Result<Plugin, ApiError> {
        self.check_create_limit(client_ip)?;

        let plugin = Plugin::from_draft(draft).map_err(ApiError::BadRequest)?;
        self.store.put(&plugin).await?;
        self.bump_create_count(client_ip);

        tracing::info!("Plugin '{}' created by {}", plugin.name, plugin.author);
        Ok(plugin)
    }

    /// Fetch a plugin, counting the read as a use
    pub async fn fetch(&self, id: &str) -> Result<Plugin, ApiError> {
        let mut plugin = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Plugin not found".to_string()))?;
        plugin.uses += 1;
        self.store.put(&plugin).await?;
        Ok(plugin)
    }

    pub async fn update(&self, id: &str, draft: &PluginDraft) -> Result<Plugin, ApiError> {
        let mut plugin = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Plugin not found".to_string()))?;
        plugin.apply_draft(draft).map_err(ApiError::BadRequest)?;
        self.store.put(&plugin).await?;
        Ok(plugin)
    }

    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        if !self.store.delete(id).await? {
            return Err(ApiError::NotFound("Plugin not found".to_string()));
        }
        Ok(())
    }

    fn check_create_limit(&self, client_ip: &str) -> Result<(), ApiError> {
        let count = self.create_counts.get(&client_ip.to_string()).unwrap_or(0);
        if count >= CREATE_LIMIT {
            let elapsed = self
                .create_counts
                .age(&client_ip.to_string())
                .unwrap_or_default();
            let time_left = self.create_window.saturating_sub(elapsed).as_secs();
            return Err(ApiError::RateLimited(format!(
                "You're creating plugins too fast! Wait {} seconds",
                time_left
            )));
        }
        Ok(())
    }

    /// Re-inserting refreshes the entry timestamp, so the window is
    /// measured from the most recent creation, not the first.
    fn bump_create_count(&self, client_ip: &str) {
        let key = client_ip.to_string();
        let count = self.create_counts.get(&key).unwrap_or(0);
        self.create_counts.insert(key, count + 1);
    }
}
