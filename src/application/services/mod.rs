//! Application services

mod analytics;
mod dashboard;
mod key_service;
mod plugin_service;
mod scripts;
mod verification;

pub use analytics::{AnalyticsService, AnalyticsStats, ExecutionRecord};
pub use dashboard::{DashboardService, DashboardStats, StartOutcome};
pub use key_service::KeyService;
pub use plugin_service::PluginService;
pub use scripts::{Script, ScriptCatalog};
pub use verification::{VerificationService, VerifyOutcome};
