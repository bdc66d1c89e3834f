//! Discord adapter
//!
//! Talks to the Discord REST API directly; channels are watched by
//! polling with a snowflake cursor rather than holding a gateway
//! websocket open.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::{ChatMessage, Embed, User};
use crate::domain::traits::{Bot, BotInfo};

/// Discord API base URL
const API_BASE: &str = "https://discord.com/api/v10";
const POLL_LIMIT: u32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub author: ApiUser,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// Discord bot adapter
pub struct DiscordAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "vadrifts".to_string(),
                platform: "discord".to_string(),
            },
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", API_BASE, path)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch our own user record from the API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        let url = self.api_url("/users/@me");
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if response.status().as_u16() == 401 {
            return Err(BotError::Auth("Invalid Discord token".to_string()));
        }

        let me: ApiUser = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        self.info = BotInfo {
            id: me.id,
            name: me.username,
            platform: "discord".to_string(),
        };
        Ok(())
    }

    fn to_chat_message(&self, msg: ApiMessage) -> ChatMessage {
        let mut sender = User::new(msg.author.id).with_username(msg.author.username);
        if msg.author.bot {
            sender = sender.bot();
        }

        let mut out = ChatMessage::new(msg.channel_id, msg.content)
            .with_id(msg.id)
            .with_sender(sender)
            .with_platform("discord");
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(&msg.timestamp) {
            out.timestamp = ts.with_timezone(&chrono::Utc);
        }
        out
    }

    async fn post_message(&self, channel_id: &str, body: serde_json::Value) -> Result<String, BotError> {
        #[derive(Deserialize)]
        struct Response {
            id: String,
        }

        let url = self.api_url(&format!("/channels/{}/messages", channel_id));
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Discord API error: {}",
                response.status()
            )));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(data.id)
    }

    fn embed_json(embed: &Embed) -> serde_json::Value {
        #[derive(Serialize)]
        struct Field<'a> {
            name: &'a str,
            value: &'a str,
            inline: bool,
        }

        let fields: Vec<Field> = embed
            .fields
            .iter()
            .map(|(name, value)| Field {
                name,
                value,
                inline: false,
            })
            .collect();

        serde_json::json!({
            "embeds": [{
                "title": embed.title,
                "description": embed.description,
                "fields": fields,
            }]
        })
    }
}

#[async_trait]
impl Bot for DiscordAdapter {
    async fn poll_channel(
        &self,
        channel_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<ChatMessage>, BotError> {
        let mut url = self.api_url(&format!(
            "/channels/{}/messages?limit={}",
            channel_id, POLL_LIMIT
        ));
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Discord API error: {}",
                response.status()
            )));
        }

        let mut messages: Vec<ApiMessage> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        // The API returns newest first; deliver oldest first
        messages.sort_by_key(|m| m.id.parse::<u64>().unwrap_or(0));
        Ok(messages
            .into_iter()
            .map(|m| self.to_chat_message(m))
            .collect())
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", channel_id, text);
        self.post_message(channel_id, serde_json::json!({ "content": text }))
            .await
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, BotError> {
        self.post_message(channel_id, Self::embed_json(embed)).await
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        let url = self.api_url(&format!("/channels/{}/messages/{}", channel_id, message_id));
        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Discord API error: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn dm_user(&self, user_id: &str, embed: &Embed) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct DmChannel {
            id: String,
        }

        let url = self.api_url("/users/@me/channels");
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "recipient_id": user_id }))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "Discord API error: {}",
                response.status()
            )));
        }

        let channel: DmChannel = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        self.post_message(&channel.id, Self::embed_json(embed)).await?;
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
