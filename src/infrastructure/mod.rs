//! Infrastructure layer - config, persistence, HTTP, adapters

pub mod adapters;
pub mod config;
pub mod http;
pub mod image;
pub mod storage;
pub mod youtube;
