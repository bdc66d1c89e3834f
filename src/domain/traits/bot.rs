use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{ChatMessage, Embed};

/// Bot trait - abstraction for chat platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Fetch messages in a channel newer than the given cursor
    async fn poll_channel(&self, channel_id: &str, after: Option<&str>) -> Result<Vec<ChatMessage>, BotError>;

    /// Send a plain text message, returning the new message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Send an embed message, returning the new message id
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, BotError>;

    /// Delete a previously sent message
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError>;

    /// Send a direct message to a user
    async fn dm_user(&self, user_id: &str, embed: &Embed) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub platform: String,
}
