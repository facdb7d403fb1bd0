//! Repository for platform settings

use async_trait::async_trait;
use chrono::Utc;
use common::error::{Error, Result};
use common::model::settings::PlatformSetting;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Settings repository trait defining the interface for setting storage
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a setting by key
    async fn get(&self, key: &str) -> Result<Option<PlatformSetting>>;

    /// Insert a setting only if the key is absent.
    ///
    /// Returns `None` when another writer created the key first; the caller
    /// is expected to re-read instead of treating the lost race as an error.
    async fn insert_if_absent(&self, setting: PlatformSetting)
        -> Result<Option<PlatformSetting>>;

    /// Create or update a setting, recording who updated it
    async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<&str>,
    ) -> Result<PlatformSetting>;

    /// List all settings
    async fn list(&self) -> Result<Vec<PlatformSetting>>;
}

/// In-memory repository for platform settings
pub struct InMemorySettingsRepository {
    /// Settings by key
    pub settings: DashMap<String, PlatformSetting>,
}

impl InMemorySettingsRepository {
    /// Create a new in-memory settings repository
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }
}

impl Default for InMemorySettingsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<PlatformSetting>> {
        Ok(self.settings.get(key).map(|s| s.clone()))
    }

    async fn insert_if_absent(
        &self,
        setting: PlatformSetting,
    ) -> Result<Option<PlatformSetting>> {
        match self.settings.entry(setting.key.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(vacant) => {
                vacant.insert(setting.clone());
                Ok(Some(setting))
            }
        }
    }

    async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<&str>,
    ) -> Result<PlatformSetting> {
        let mut entry = self
            .settings
            .entry(key.to_string())
            .or_insert_with(|| {
                PlatformSetting::new(key, value, description.map(str::to_string))
            });

        entry.value = value.to_string();
        entry.updated_by = updated_by.map(str::to_string);
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }

    async fn list(&self) -> Result<Vec<PlatformSetting>> {
        Ok(self.settings.iter().map(|entry| entry.clone()).collect())
    }
}

/// PostgreSQL repository for platform settings
pub struct PostgresSettingsRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresSettingsRepository {
    /// Create a new PostgreSQL settings repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new PostgreSQL settings repository from a configuration
    pub async fn with_config(config: &crate::config::SettingsServiceConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }
}

const SETTING_COLUMNS: &str = "id, key, value, description, updated_by, created_at, updated_at";

fn setting_from_row(row: &sqlx::postgres::PgRow) -> PlatformSetting {
    PlatformSetting {
        id: row.get("id"),
        key: row.get("key"),
        value: row.get("value"),
        description: row.get("description"),
        updated_by: row.get("updated_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<PlatformSetting>> {
        debug!("Getting setting from database: {}", key);

        let row = sqlx::query(&format!(
            "SELECT {} FROM platform_settings WHERE key = $1",
            SETTING_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| setting_from_row(&r)))
    }

    async fn insert_if_absent(
        &self,
        setting: PlatformSetting,
    ) -> Result<Option<PlatformSetting>> {
        debug!("Initializing setting if absent: {}", setting.key);

        // ON CONFLICT DO NOTHING returns no row when the key already exists
        let row = sqlx::query(&format!(
            "INSERT INTO platform_settings (id, key, value, description, updated_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (key) DO NOTHING
             RETURNING {}",
            SETTING_COLUMNS
        ))
        .bind(setting.id)
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(&setting.description)
        .bind(&setting.updated_by)
        .bind(setting.created_at)
        .bind(setting.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| setting_from_row(&r)))
    }

    async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        updated_by: Option<&str>,
    ) -> Result<PlatformSetting> {
        debug!("Upserting setting: {}", key);

        let row = sqlx::query(&format!(
            "INSERT INTO platform_settings (id, key, value, description, updated_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (key)
             DO UPDATE SET
                value = EXCLUDED.value,
                updated_by = EXCLUDED.updated_by,
                updated_at = now()
             RETURNING {}",
            SETTING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(setting_from_row(&row))
    }

    async fn list(&self) -> Result<Vec<PlatformSetting>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM platform_settings ORDER BY key",
            SETTING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(setting_from_row).collect())
    }
}
