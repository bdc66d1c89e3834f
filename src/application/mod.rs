//! Application layer - errors, shared utilities, services

pub mod cache;
pub mod errors;
pub mod services;
