//! Domain traits

mod bot;
mod store;

pub use bot::{Bot, BotInfo};
pub use store::PluginStore;
