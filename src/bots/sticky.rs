//! Stickied message responder
//!
//! Keeps one pinned-by-repetition message at the bottom of a channel:
//! whenever anyone posts, the previous sticky is deleted and re-sent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::{ChatMessage, Embed};
use crate::domain::traits::Bot;

use super::Responder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StickyRecord {
    content: Option<String>,
    embed: Option<Embed>,
    last_message: Option<String>,
}

pub struct StickyResponder {
    path: PathBuf,
    stickies: Arc<Mutex<HashMap<String, StickyRecord>>>,
}

impl StickyResponder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stickies: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load persisted stickies. Missing or corrupt file starts empty.
    pub async fn init(&self) -> Result<(), BotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(loaded) => {
                    let mut stickies = self.stickies.lock().await;
                    *stickies = loaded;
                }
                Err(e) => tracing::error!("Error loading stickied messages: {}", e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BotError::Internal(e.to_string())),
        }
        Ok(())
    }

    async fn save(&self, stickies: &HashMap<String, StickyRecord>) {
        if let Some(parent) = self.path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        match serde_json::to_string(stickies) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&self.path, json).await {
                    tracing::error!("Error saving stickied messages: {}", e);
                }
            }
            Err(e) => tracing::error!("Error saving stickied messages: {}", e),
        }
    }

    /// Handle the management commands. Returns the reply text.
    async fn handle_command(&self, msg: &ChatMessage) -> Option<String> {
        let text = msg.text.trim();
        let mut stickies = self.stickies.lock().await;

        let reply = if let Some(content) = text.strip_prefix("!setstickied ") {
            stickies.insert(
                msg.channel_id.clone(),
                StickyRecord {
                    content: Some(content.trim().to_string()),
                    embed: None,
                    last_message: None,
                },
            );
            "Stickied message set."
        } else if let Some(rest) = text.strip_prefix("!setstickiedembed ") {
            let Some((title, description)) = rest.split_once('|') else {
                return Some("Usage: !setstickiedembed <title> | <description>".to_string());
            };
            stickies.insert(
                msg.channel_id.clone(),
                StickyRecord {
                    content: None,
                    embed: Some(Embed::new(title.trim(), description.trim())),
                    last_message: None,
                },
            );
            "Stickied embed set."
        } else if text == "!removestickied" {
            if stickies.remove(&msg.channel_id).is_none() {
                return Some("No stickied message set.".to_string());
            }
            "Stickied message removed."
        } else {
            return None;
        };

        let snapshot = stickies.clone();
        drop(stickies);
        self.save(&snapshot).await;
        Some(reply.to_string())
    }

    /// Re-post the sticky underneath a new message
    async fn repost(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
        let mut stickies = self.stickies.lock().await;
        let record = match stickies.get_mut(&msg.channel_id) {
            Some(r) => r,
            None => return Ok(false),
        };

        if let Some(last) = record.last_message.take() {
            // The old sticky may already be gone; not fatal
            if let Err(e) = bot.delete_message(&msg.channel_id, &last).await {
                tracing::debug!("Could not delete old sticky: {}", e);
            }
        }

        let new_id = match &record.embed {
            Some(embed) => bot.send_embed(&msg.channel_id, embed).await?,
            None => {
                let content = record.content.clone().unwrap_or_default();
                bot.send_message(&msg.channel_id, &content).await?
            }
        };
        record.last_message = Some(new_id);

        let snapshot = stickies.clone();
        drop(stickies);
        self.save(&snapshot).await;
        Ok(true)
    }
}

#[async_trait]
impl Responder for StickyResponder {
    fn name(&self) -> &str {
        "sticky"
    }

    async fn handle(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
        if msg.from_bot() {
            return Ok(false);
        }
        if let Some(reply) = self.handle_command(msg).await {
            bot.send_message(&msg.channel_id, &reply).await?;
            return Ok(true);
        }
        self.repost(msg, bot).await
    }
}
