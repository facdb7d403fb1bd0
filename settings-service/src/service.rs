//! Settings service implementation
//!
//! The default commission rate is process-wide mutable configuration; every
//! read goes to the store, there is no in-memory cache.

use std::sync::Arc;

use common::error::{Error, Result};
use common::model::settings::{self, PlatformSetting, DEFAULT_COMMISSION_RATE_KEY};
use common::model::user::{Action, Actor};
use common::money::{dec, precision, Rate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::repository::{InMemorySettingsRepository, SettingsRepository};

const RATE_DESCRIPTION: &str = "Default platform commission rate percentage";

/// Settings service for platform-wide configuration
pub struct SettingsService {
    /// Repository for setting data
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    /// Create a new settings service
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Create a new settings service over an in-memory repository
    pub fn in_memory() -> Self {
        Self {
            repo: Arc::new(InMemorySettingsRepository::new()),
        }
    }

    /// Get the platform default commission rate, lazily creating the setting
    /// with the built-in default on first read.
    ///
    /// A concurrent first read losing the insert race re-reads the winner's
    /// row instead of surfacing an error.
    pub async fn default_commission_rate(&self) -> Result<Rate> {
        if let Some(setting) = self.repo.get(DEFAULT_COMMISSION_RATE_KEY).await? {
            return parse_rate(&setting.value);
        }

        debug!(
            "Setting {} absent, initializing with built-in default",
            DEFAULT_COMMISSION_RATE_KEY
        );

        let seeded = PlatformSetting::new(
            DEFAULT_COMMISSION_RATE_KEY,
            settings::default_commission_rate().to_string(),
            Some(RATE_DESCRIPTION.to_string()),
        );

        match self.repo.insert_if_absent(seeded).await? {
            Some(created) => parse_rate(&created.value),
            None => {
                let setting = self
                    .repo
                    .get(DEFAULT_COMMISSION_RATE_KEY)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "Setting {} missing after initialization",
                            DEFAULT_COMMISSION_RATE_KEY
                        ))
                    })?;
                parse_rate(&setting.value)
            }
        }
    }

    /// Update the platform default commission rate, recording the acting user
    pub async fn update_default_commission_rate(
        &self,
        actor: &Actor,
        rate: Rate,
    ) -> Result<Rate> {
        actor.require(Action::UpdateSettings)?;

        if rate < Decimal::ZERO || rate > dec!(100) {
            return Err(Error::InvalidCommissionRate(format!(
                "Commission rate must be between 0 and 100, got {}",
                rate
            )));
        }

        let rate = precision::round_rate(rate);
        let setting = self
            .repo
            .upsert(
                DEFAULT_COMMISSION_RATE_KEY,
                &rate.to_string(),
                Some(RATE_DESCRIPTION),
                Some(&actor.user_id),
            )
            .await?;

        info!(
            "Default commission rate updated to {}% by {}",
            rate, actor.user_id
        );

        parse_rate(&setting.value)
    }

    /// List all platform settings
    pub async fn list_settings(&self, actor: &Actor) -> Result<Vec<PlatformSetting>> {
        actor.require(Action::ViewSettings)?;
        self.repo.list().await
    }
}

fn parse_rate(value: &str) -> Result<Rate> {
    Ok(value.parse::<Rate>()?)
}
