//! Domain layer - entities and trait definitions

pub mod entities;
pub mod traits;
