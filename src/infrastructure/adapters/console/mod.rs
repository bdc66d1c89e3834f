//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::application::errors::BotError;
use crate::domain::entities::{ChatMessage, Embed, User};
use crate::domain::traits::{Bot, BotInfo};

/// Console bot adapter: stdin lines in, println out
pub struct ConsoleAdapter {
    info: BotInfo,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "vadrifts".to_string(),
                platform: "console".to_string(),
            },
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn poll_channel(
        &self,
        channel_id: &str,
        _after: Option<&str>,
    ) -> Result<Vec<ChatMessage>, BotError> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => {
                let msg = ChatMessage::new(channel_id, line.trim())
                    .with_sender(User::new("console-user"))
                    .with_platform("console");
                Ok(vec![msg])
            }
            Ok(_) => Ok(Vec::new()),
            Err(e) => Err(BotError::Internal(e.to_string())),
        }
    }

    async fn send_message(&self, _channel_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }

    async fn send_embed(&self, _channel_id: &str, embed: &Embed) -> Result<String, BotError> {
        println!("[BOT] {}: {}", embed.title, embed.description);
        for (name, value) in &embed.fields {
            println!("  {} = {}", name, value);
        }
        Ok("console_msg".to_string())
    }

    async fn delete_message(&self, _channel_id: &str, _message_id: &str) -> Result<(), BotError> {
        Ok(())
    }

    async fn dm_user(&self, user_id: &str, embed: &Embed) -> Result<(), BotError> {
        println!("[DM to {}] {}: {}", user_id, embed.title, embed.description);
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
