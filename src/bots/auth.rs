//! HWID authentication relay
//!
//! Users submit their hardware ID in chat; the relay forwards it to a
//! staff log channel and DMs the owner so a key can be issued manually.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{ChatMessage, Embed};
use crate::domain::traits::Bot;

use super::Responder;

const MAX_HWID_LEN: usize = 128;

pub struct AuthRelay {
    log_channel: Option<String>,
    owner_id: Option<String>,
}

impl AuthRelay {
    pub fn new(log_channel: Option<String>, owner_id: Option<String>) -> Self {
        Self {
            log_channel,
            owner_id,
        }
    }

    fn instructions() -> Embed {
        Embed::new(
            "Authentication",
            "Reply with `!hwid <your hardware id>` and a staff member will \
             verify you shortly.",
        )
    }

    async fn relay_hwid(
        &self,
        msg: &ChatMessage,
        hwid: &str,
        bot: &Arc<dyn Bot>,
    ) -> Result<(), BotError> {
        let username = msg
            .sender
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| "unknown".to_string());
        let user_id = msg.sender_id().unwrap_or("unknown").to_string();

        let report = Embed::new("HWID Authentication Request", "A user submitted a hardware ID.")
            .with_field("User", format!("{} ({})", username, user_id))
            .with_field("HWID", hwid.to_string());

        if let Some(channel) = &self.log_channel {
            bot.send_embed(channel, &report).await?;
        }
        if let Some(owner) = &self.owner_id {
            if let Err(e) = bot.dm_user(owner, &report).await {
                tracing::warn!("Could not DM owner about auth request: {}", e);
            }
        }

        let confirmation = Embed::new(
            "Request received",
            "Your hardware ID was forwarded. You'll be contacted once it's processed.",
        );
        bot.send_embed(&msg.channel_id, &confirmation).await?;
        Ok(())
    }
}

#[async_trait]
impl Responder for AuthRelay {
    fn name(&self) -> &str {
        "auth-relay"
    }

    async fn handle(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
        if msg.from_bot() {
            return Ok(false);
        }
        let text = msg.text.trim();

        if text == "!authenticate" {
            bot.send_embed(&msg.channel_id, &Self::instructions()).await?;
            return Ok(true);
        }

        if let Some(hwid) = text.strip_prefix("!hwid ") {
            let hwid = hwid.trim();
            if hwid.is_empty() || hwid.len() > MAX_HWID_LEN {
                bot.send_message(
                    &msg.channel_id,
                    "That doesn't look like a valid hardware ID.",
                )
                .await?;
                return Ok(true);
            }
            self.relay_hwid(msg, hwid, bot).await?;
            return Ok(true);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::testing::{RecordingBot, SentItem};
    use crate::domain::entities::User;

    fn relay() -> AuthRelay {
        AuthRelay::new(Some("auth-log".to_string()), Some("owner-1".to_string()))
    }

    fn message(text: &str) -> ChatMessage {
        ChatMessage::new("general", text)
            .with_sender(User::new("99").with_username("tester"))
    }

    #[tokio::test]
    async fn authenticate_sends_instructions() {
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        assert!(relay().handle(&message("!authenticate"), &bot).await.unwrap());
        assert_eq!(
            recording.items(),
            vec![SentItem::Embed {
                channel_id: "general".to_string(),
                title: "Authentication".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn hwid_is_relayed_to_log_channel_owner_and_submitter() {
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        assert!(relay()
            .handle(&message("!hwid ABC-123-DEF"), &bot)
            .await
            .unwrap());

        assert_eq!(
            recording.items(),
            vec![
                SentItem::Embed {
                    channel_id: "auth-log".to_string(),
                    title: "HWID Authentication Request".to_string(),
                },
                SentItem::Dm {
                    user_id: "owner-1".to_string(),
                    title: "HWID Authentication Request".to_string(),
                },
                SentItem::Embed {
                    channel_id: "general".to_string(),
                    title: "Request received".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_hwid_is_rejected() {
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        assert!(relay().handle(&message("!hwid    "), &bot).await.unwrap());
        assert_eq!(
            recording.items(),
            vec![SentItem::Text {
                channel_id: "general".to_string(),
                text: "That doesn't look like a valid hardware ID.".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn unrelated_messages_pass_through() {
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();
        assert!(!relay().handle(&message("hello"), &bot).await.unwrap());
        assert!(recording.items().is_empty());
    }
}
