//! Chat platform adapters

pub mod console;
pub mod discord;
