//! Domain entities

mod message;
mod plugin;
mod user;

pub use message::{ChatMessage, Embed};
pub use plugin::{Plugin, PluginDraft};
pub use user::User;
