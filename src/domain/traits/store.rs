use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::Plugin;

/// PluginStore trait - abstraction for plugin record persistence
#[async_trait]
pub trait PluginStore: Send + Sync {
    /// All plugins, unordered
    async fn all(&self) -> Result<Vec<Plugin>, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<Plugin>, StorageError>;

    /// Insert or replace a plugin record
    async fn put(&self, plugin: &Plugin) -> Result<(), StorageError>;

    /// Delete a plugin. Returns false when the id was unknown.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;
}
