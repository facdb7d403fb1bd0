//! Service listing models
//!
//! Listings are external collaborator data as far as the order lifecycle is
//! concerned: the engine reads `price` and `name` at checkout time and joins
//! display fields into reporting views, nothing else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::money::Amount;

/// Closed set of service categories offered on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    GraphicDesign,
    Branding,
    WebDesign,
    SocialMedia,
    VideoEditing,
    ThreeDDesign,
    Illustration,
}

impl ServiceCategory {
    /// Wire/database encoding of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::GraphicDesign => "graphic_design",
            ServiceCategory::Branding => "branding",
            ServiceCategory::WebDesign => "web_design",
            ServiceCategory::SocialMedia => "social_media",
            ServiceCategory::VideoEditing => "video_editing",
            ServiceCategory::ThreeDDesign => "three_d_design",
            ServiceCategory::Illustration => "illustration",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graphic_design" => Ok(ServiceCategory::GraphicDesign),
            "branding" => Ok(ServiceCategory::Branding),
            "web_design" => Ok(ServiceCategory::WebDesign),
            "social_media" => Ok(ServiceCategory::SocialMedia),
            "video_editing" => Ok(ServiceCategory::VideoEditing),
            "three_d_design" => Ok(ServiceCategory::ThreeDDesign),
            "illustration" => Ok(ServiceCategory::Illustration),
            other => Err(Error::ValidationError(format!(
                "Unknown service category: {}",
                other
            ))),
        }
    }
}

/// A purchasable service listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    /// Unique listing ID
    pub id: Uuid,
    /// URL-friendly unique slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Description shown on the listing page
    pub description: String,
    /// Category
    pub category: ServiceCategory,
    /// Listed price in currency units
    pub price: Amount,
    /// Promised delivery time in days
    pub delivery_days: i32,
    /// Whether the listing is purchasable
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ServiceListing {
    /// Create a new active listing
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: ServiceCategory,
        price: Amount,
        delivery_days: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: name.into(),
            description: description.into(),
            category,
            price,
            delivery_days,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
