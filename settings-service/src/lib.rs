//! Platform settings provider for the marketplace

pub mod config;
pub mod repository;
pub mod service;

pub use config::SettingsServiceConfig;
pub use repository::{InMemorySettingsRepository, PostgresSettingsRepository, SettingsRepository};
pub use service::SettingsService;
