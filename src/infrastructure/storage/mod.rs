//! JSON file-backed plugin persistence

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::Plugin;
use crate::domain::traits::PluginStore;

/// Plugin store persisting to a single JSON file
pub struct JsonPluginStore {
    path: PathBuf,
    plugins: Arc<RwLock<HashMap<String, Plugin>>>,
}

impl JsonPluginStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            plugins: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load existing records. A missing or corrupt file starts empty.
    pub async fn init(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<Vec<Plugin>>(&content) {
                Ok(loaded) => {
                    let mut plugins = self.plugins.write().await;
                    *plugins = loaded.into_iter().map(|p| (p.id.clone(), p)).collect();
                    tracing::info!("Loaded {} plugins from {}", plugins.len(), self.path.display());
                }
                Err(e) => {
                    tracing::error!("Error loading plugins: {}", e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Write all records out, via a temp file so a crash never truncates
    async fn persist(&self, plugins: &HashMap<String, Plugin>) -> Result<(), StorageError> {
        let records: Vec<&Plugin> = plugins.values().collect();
        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PluginStore for JsonPluginStore {
    async fn all(&self) -> Result<Vec<Plugin>, StorageError> {
        let plugins = self.plugins.read().await;
        Ok(plugins.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Plugin>, StorageError> {
        let plugins = self.plugins.read().await;
        Ok(plugins.get(id).cloned())
    }

    async fn put(&self, plugin: &Plugin) -> Result<(), StorageError> {
        let mut plugins = self.plugins.write().await;
        plugins.insert(plugin.id.clone(), plugin.clone());
        self.persist(&plugins).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let mut plugins = self.plugins.write().await;
        let removed = plugins.remove(id).is_some();
        if removed {
            self.persist(&plugins).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PluginDraft;
    use indexmap::IndexMap;

    fn sample_plugin(name: &str) -> Plugin {
        let mut sections = IndexMap::new();
        sections.insert("General".to_string(), vec!["hi".to_string()]);
        Plugin::from_draft(&PluginDraft {
            name: Some(name.to_string()),
            sections: Some(sections),
            ..Default::default()
        })
        .unwrap()
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("vadrifts-test-{}", uuid::Uuid::new_v4()))
            .join("plugins.json")
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = JsonPluginStore::new(temp_path());
        store.init().await.unwrap();

        let plugin = sample_plugin("test");
        store.put(&plugin).await.unwrap();
        assert_eq!(store.get(&plugin.id).await.unwrap().unwrap().name, "test");

        assert!(store.delete(&plugin.id).await.unwrap());
        assert!(!store.delete(&plugin.id).await.unwrap());
        assert!(store.get(&plugin.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_survive_reload() {
        let path = temp_path();
        let store = JsonPluginStore::new(path.clone());
        store.init().await.unwrap();
        store.put(&sample_plugin("persisted")).await.unwrap();

        let reopened = JsonPluginStore::new(path);
        reopened.init().await.unwrap();
        assert_eq!(reopened.all().await.unwrap().len(), 1);
    }
}
