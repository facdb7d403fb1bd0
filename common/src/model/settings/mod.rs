//! Platform settings model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{dec, Rate};

/// Key of the platform-wide default commission rate setting
pub const DEFAULT_COMMISSION_RATE_KEY: &str = "default_commission_rate";

/// Hard-coded default used to lazily initialize the commission rate setting
pub fn default_commission_rate() -> Rate {
    dec!(20.00)
}

/// A single named platform setting, string-encoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSetting {
    /// Unique setting ID
    pub id: Uuid,
    /// Unique setting key
    pub key: String,
    /// Stored as a string, parsed as needed
    pub value: String,
    /// Optional human-readable description
    pub description: Option<String>,
    /// User who last updated the setting
    pub updated_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PlatformSetting {
    /// Create a new setting
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            value: value.into(),
            description,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
