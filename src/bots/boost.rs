//! Boost thank-you responder
//!
//! Waits a beat after a boost announcement, then thanks the booster.
//! A repeat announcement from the same user replaces the pending reply
//! instead of stacking a second one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::application::errors::BotError;
use crate::domain::entities::ChatMessage;
use crate::domain::traits::Bot;

use super::Responder;

const BOOST_MARKER: &str = "just boosted the server!";

pub struct BoostThanks {
    channel_id: String,
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl BoostThanks {
    pub fn new(channel_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            channel_id: channel_id.into(),
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Responder for BoostThanks {
    fn name(&self) -> &str {
        "boost-thanks"
    }

    async fn handle(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
        if msg.channel_id != self.channel_id
            || !msg.text.to_lowercase().contains(BOOST_MARKER)
        {
            return Ok(false);
        }
        let (user_id, mention) = match &msg.sender {
            Some(user) => (user.id.clone(), user.mention()),
            None => return Ok(false),
        };

        let mut pending = self.pending.lock().await;
        if let Some(task) = pending.remove(&user_id) {
            task.abort();
        }

        let bot = Arc::clone(bot);
        let channel = self.channel_id.clone();
        let delay = self.delay;
        let pending_map = Arc::clone(&self.pending);
        let task_user = user_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = bot.send_message(&channel, &format!("{} good boy", mention)).await {
                tracing::warn!("Boost thank-you failed: {}", e);
            }
            pending_map.lock().await.remove(&task_user);
        });
        pending.insert(user_id, task);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::testing::{RecordingBot, SentItem};
    use crate::domain::entities::User;

    fn boost_message(user_id: &str) -> ChatMessage {
        ChatMessage::new("boost-channel", "someone just boosted the server!")
            .with_sender(User::new(user_id))
    }

    #[tokio::test]
    async fn thanks_after_delay() {
        let responder = BoostThanks::new("boost-channel", Duration::from_millis(10));
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        assert!(responder.handle(&boost_message("42"), &bot).await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            recording.items(),
            vec![SentItem::Text {
                channel_id: "boost-channel".to_string(),
                text: "<@42> good boy".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn duplicate_boost_sends_single_thanks() {
        let responder = BoostThanks::new("boost-channel", Duration::from_millis(30));
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        responder.handle(&boost_message("42"), &bot).await.unwrap();
        responder.handle(&boost_message("42"), &bot).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(recording.items().len(), 1);
    }

    #[tokio::test]
    async fn other_channels_are_ignored() {
        let responder = BoostThanks::new("boost-channel", Duration::from_millis(1));
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        let msg = ChatMessage::new("general", "someone just boosted the server!")
            .with_sender(User::new("42"));
        assert!(!responder.handle(&msg, &bot).await.unwrap());
    }
}
