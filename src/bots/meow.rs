//! Meow responder
//!
//! Replies to "meow" with a random number of meows. The count never
//! repeats back to back, which reads less robotic in chat.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use regex_lite::Regex;

use crate::application::errors::BotError;
use crate::domain::entities::ChatMessage;
use crate::domain::traits::Bot;

use super::Responder;

static MEOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmeow\b").unwrap());

const COUNTS: [usize; 6] = [2, 3, 4, 5, 6, 7];
const WEIGHTS: [u32; 6] = [5, 4, 3, 2, 1, 1];
const PUNCTUATION: [&str; 4] = ["", "!", "!!", "."];
const CUTE_SYMBOLS: [&str; 4] = [">///<", "^-^", "o///o", "x3"];

pub struct MeowResponder {
    last_count: Mutex<Option<usize>>,
}

impl MeowResponder {
    pub fn new() -> Self {
        Self {
            last_count: Mutex::new(None),
        }
    }

    fn pick_count(&self) -> usize {
        let last = *self.last_count.lock().unwrap();
        let mut weights = WEIGHTS;
        if let Some(last) = last {
            if let Some(idx) = COUNTS.iter().position(|&c| c == last) {
                weights[idx] = 0;
            }
        }

        let dist = WeightedIndex::new(weights).expect("weights are never all zero");
        let count = COUNTS[dist.sample(&mut rand::thread_rng())];
        *self.last_count.lock().unwrap() = Some(count);
        count
    }

    fn compose(&self) -> String {
        let count = self.pick_count();
        let mut rng = rand::thread_rng();
        let punctuation = PUNCTUATION[rng.gen_range(0..PUNCTUATION.len())];
        let symbol = if rng.gen_range(1..=3) == 1 {
            CUTE_SYMBOLS[rng.gen_range(0..CUTE_SYMBOLS.len())]
        } else {
            ""
        };

        let mut reply = "meow ".repeat(count).trim_end().to_string();
        reply.push_str(punctuation);
        if !symbol.is_empty() {
            reply.push(' ');
            reply.push_str(symbol);
        }
        reply
    }
}

impl Default for MeowResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Responder for MeowResponder {
    fn name(&self) -> &str {
        "meow"
    }

    async fn handle(&self, msg: &ChatMessage, bot: &Arc<dyn Bot>) -> Result<bool, BotError> {
        if !MEOW_RE.is_match(&msg.text) {
            return Ok(false);
        }
        bot.send_message(&msg.channel_id, &self.compose()).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::testing::RecordingBot;
    use crate::domain::entities::User;

    #[test]
    fn matches_whole_word_only() {
        assert!(MEOW_RE.is_match("Meow everyone"));
        assert!(MEOW_RE.is_match("I said MEOW."));
        assert!(!MEOW_RE.is_match("homeowner"));
    }

    #[test]
    fn count_never_repeats_consecutively() {
        let responder = MeowResponder::new();
        let mut previous = responder.pick_count();
        for _ in 0..200 {
            let next = responder.pick_count();
            assert_ne!(next, previous);
            assert!((2..=7).contains(&next));
            previous = next;
        }
    }

    #[tokio::test]
    async fn replies_with_meows() {
        let responder = MeowResponder::new();
        let recording = Arc::new(RecordingBot::default());
        let bot: Arc<dyn Bot> = recording.clone();

        let msg = ChatMessage::new("general", "meow").with_sender(User::new("1"));
        assert!(responder.handle(&msg, &bot).await.unwrap());
        assert_eq!(recording.items().len(), 1);

        let ignored = ChatMessage::new("general", "hello").with_sender(User::new("1"));
        assert!(!responder.handle(&ignored, &bot).await.unwrap());
    }
}
