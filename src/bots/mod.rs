//! Bot behaviors
//!
//! Each behavior is a `Responder` fed every message the runner polls
//! from the watched channels.

mod auth;
mod boost;
mod meow;
mod sticky;

pub use auth::AuthRelay;
pub use boost::BoostThanks;
pub use meow::MeowResponder;
pub use sticky::StickyResponder;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::ChatMessage;
use crate::domain::traits::Bot;

/// A single bot behavior
#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    /// React to one message. Returns true when the responder acted on it.
    async fn handle(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError>;
}

/// Polls the watched channels and fans messages out to the responders
pub struct BotRunner {
    bot: Arc<dyn Bot>,
    responders: Vec<Arc<dyn Responder>>,
    channels: Vec<String>,
    poll_interval: Duration,
}

impl BotRunner {
    pub fn new(bot: Arc<dyn Bot>, channels: Vec<String>, poll_interval: Duration) -> Self {
        Self {
            bot,
            responders: Vec::new(),
            channels,
            poll_interval,
        }
    }

    pub fn with_responder<R: Responder + 'static>(mut self, responder: R) -> Self {
        self.responders.push(Arc::new(responder));
        self
    }

    /// Poll loop. Runs until the task is aborted.
    pub async fn run(self) {
        let info = self.bot.bot_info();
        tracing::info!("Bot started: {} on {}", info.name, info.platform);

        let mut state = PollState::default();
        loop {
            self.poll_channels(&mut state).await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One poll pass over every watched channel.
    ///
    /// The first successful poll of a channel only seeds the cursor:
    /// without a cursor the platform hands back recent history, and
    /// replaying it after a restart would re-trigger every responder.
    async fn poll_channels(&self, state: &mut PollState) {
        let info = self.bot.bot_info();
        for channel in &self.channels {
            let after = state.cursors.get(channel).map(String::as_str);
            match self.bot.poll_channel(channel, after).await {
                Ok(messages) => {
                    let live = state.seeded.contains(channel);
                    for msg in &messages {
                        state.cursors.insert(channel.clone(), msg.id.clone());
                        if !live {
                            continue;
                        }
                        if msg.sender_id() == Some(info.id.as_str()) {
                            continue;
                        }
                        self.dispatch(msg).await;
                    }
                    if !live {
                        tracing::debug!(
                            "Seeded {} past {} historical messages",
                            channel,
                            messages.len()
                        );
                        state.seeded.insert(channel.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!("Polling {} failed: {}", channel, e);
                }
            }
        }
    }

    async fn dispatch(&self, msg: &ChatMessage) {
        for responder in &self.responders {
            match responder.handle(msg, &self.bot).await {
                Ok(true) => {
                    tracing::debug!("[{}] handled message {}", responder.name(), msg.id);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("[{}] error: {}", responder.name(), e);
                }
            }
        }
    }
}

/// Per-channel cursor and seeding bookkeeping for the poll loop
#[derive(Default)]
struct PollState {
    cursors: HashMap<String, String>,
    seeded: HashSet<String>,
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory bot used by responder tests

    use super::*;
    use crate::domain::entities::Embed;
    use crate::domain::traits::BotInfo;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SentItem {
        Text { channel_id: String, text: String },
        Embed { channel_id: String, title: String },
        Deleted { channel_id: String, message_id: String },
        Dm { user_id: String, title: String },
    }

    #[derive(Default)]
    pub struct RecordingBot {
        pub sent: Mutex<Vec<SentItem>>,
        pub next_id: Mutex<u64>,
    }

    impl RecordingBot {
        pub fn items(&self) -> Vec<SentItem> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn poll_channel(
            &self,
            _channel_id: &str,
            _after: Option<&str>,
        ) -> Result<Vec<ChatMessage>, BotError> {
            Ok(Vec::new())
        }

        async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
            self.sent.lock().unwrap().push(SentItem::Text {
                channel_id: channel_id.to_string(),
                text: text.to_string(),
            });
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            Ok(id.to_string())
        }

        async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<String, BotError> {
            self.sent.lock().unwrap().push(SentItem::Embed {
                channel_id: channel_id.to_string(),
                title: embed.title.clone(),
            });
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            Ok(id.to_string())
        }

        async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push(SentItem::Deleted {
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            });
            Ok(())
        }

        async fn dm_user(&self, user_id: &str, embed: &Embed) -> Result<(), BotError> {
            self.sent.lock().unwrap().push(SentItem::Dm {
                user_id: user_id.to_string(),
                title: embed.title.clone(),
            });
            Ok(())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo {
                id: "bot-self".to_string(),
                name: "vadrifts".to_string(),
                platform: "test".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Embed, User};
    use crate::domain::traits::BotInfo;
    use std::sync::Mutex;

    /// Bot returning channel history for a cursorless poll, like the
    /// messages endpoint does, and only newer messages afterwards
    struct HistoryBot {
        messages: Vec<ChatMessage>,
    }

    #[async_trait]
    impl Bot for HistoryBot {
        async fn poll_channel(
            &self,
            _channel_id: &str,
            after: Option<&str>,
        ) -> Result<Vec<ChatMessage>, BotError> {
            Ok(self
                .messages
                .iter()
                .filter(|m| match after {
                    Some(after) => m.id.as_str() > after,
                    None => true,
                })
                .cloned()
                .collect())
        }

        async fn send_message(&self, _channel_id: &str, _text: &str) -> Result<String, BotError> {
            Ok("0".to_string())
        }

        async fn send_embed(&self, _channel_id: &str, _embed: &Embed) -> Result<String, BotError> {
            Ok("0".to_string())
        }

        async fn delete_message(&self, _channel_id: &str, _message_id: &str) -> Result<(), BotError> {
            Ok(())
        }

        async fn dm_user(&self, _user_id: &str, _embed: &Embed) -> Result<(), BotError> {
            Ok(())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo {
                id: "bot-self".to_string(),
                name: "vadrifts".to_string(),
                platform: "test".to_string(),
            }
        }
    }

    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Responder for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, msg: &ChatMessage, _bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
            self.seen.lock().unwrap().push(msg.id.clone());
            Ok(true)
        }
    }

    fn message(id: &str, sender: &str) -> ChatMessage {
        ChatMessage::new("general", "meow")
            .with_id(id)
            .with_sender(User::new(sender))
    }

    #[tokio::test]
    async fn history_seeds_the_cursor_without_dispatching() {
        let bot: Arc<dyn Bot> = Arc::new(HistoryBot {
            messages: vec![message("100", "u1"), message("101", "u2")],
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runner = BotRunner::new(bot, vec!["general".to_string()], Duration::from_secs(1))
            .with_responder(Recorder { seen: seen.clone() });

        let mut state = PollState::default();
        runner.poll_channels(&mut state).await;

        // Backlog from before startup never reaches the responders
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(state.cursors.get("general").map(String::as_str), Some("101"));
    }

    #[tokio::test]
    async fn only_live_messages_are_dispatched() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut state = PollState::default();

        let backlog: Arc<dyn Bot> = Arc::new(HistoryBot {
            messages: vec![message("100", "u1")],
        });
        let runner = BotRunner::new(backlog, vec!["general".to_string()], Duration::from_secs(1))
            .with_responder(Recorder { seen: seen.clone() });
        runner.poll_channels(&mut state).await;

        // New messages arrive after the seed pass, including one of ours
        let live: Arc<dyn Bot> = Arc::new(HistoryBot {
            messages: vec![
                message("100", "u1"),
                message("101", "u2"),
                message("102", "bot-self"),
                message("103", "u3"),
            ],
        });
        let runner = BotRunner::new(live, vec!["general".to_string()], Duration::from_secs(1))
            .with_responder(Recorder { seen: seen.clone() });
        runner.poll_channels(&mut state).await;

        assert_eq!(*seen.lock().unwrap(), vec!["101".to_string(), "103".to_string()]);
        assert_eq!(state.cursors.get("general").map(String::as_str), Some("103"));
    }
}
