use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::MarketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
}

impl ListingStatus {
    pub fn code(self) -> &'static str {
        match self {
            ListingStatus::Active => "A",
            ListingStatus::Inactive => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(ListingStatus::Active),
            "I" => Some(ListingStatus::Inactive),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ListingStatus::Active => ListingStatus::Inactive,
            ListingStatus::Inactive => ListingStatus::Active,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "Ativo",
            ListingStatus::Inactive => "Inativo",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub email: String,
}

/// 一筆以物易物的刊登
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub images: Vec<String>,
    pub interests: Vec<String>,
    pub opportunities: Vec<String>,
    pub price: f64,
    pub category_id: String,
    pub user_id: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: Option<String>,
    pub owner: Option<Owner>,
}

impl Listing {
    /// 沒有 `images` 時，`image` 是唯一可顯示的圖片
    pub fn display_images(&self) -> Vec<&str> {
        if self.images.is_empty() {
            vec![self.image.as_str()]
        } else {
            self.images.iter().map(String::as_str).collect()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Same listing with the opposite status; no other field changes.
    pub fn toggled(&self) -> Listing {
        Listing {
            status: self.status.toggled(),
            ..self.clone()
        }
    }
}

/// Insert payload for the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub image: String,
    pub images: Vec<String>,
    pub interests: Vec<String>,
    pub opportunities: Vec<String>,
    pub price: f64,
    pub category_id: String,
    pub user_id: String,
    pub status: ListingStatus,
}

/// Partial update; `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
}

impl ListingChanges {
    pub fn status(status: ListingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Any,
    Only(ListingStatus),
}

impl FromStr for StatusFilter {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "any" => Ok(StatusFilter::Any),
            "a" | "active" => Ok(StatusFilter::Only(ListingStatus::Active)),
            "i" | "inactive" => Ok(StatusFilter::Only(ListingStatus::Inactive)),
            other => Err(MarketError::validation(format!(
                "Unknown status filter '{}', use all, active or inactive",
                other
            ))),
        }
    }
}

/// 瀏覽 feed 時的篩選條件，不會被持久化
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub search_term: String,
    pub category_id: Option<String>,
    pub status: StatusFilter,
}

impl FilterCriteria {
    pub fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty()
            || self.category_id.as_deref().is_some_and(|id| !id.is_empty())
            || self.status != StatusFilter::Any
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_listing() -> Listing {
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        Listing {
            id: "l-1".to_string(),
            title: "Notebook".to_string(),
            description: "Dell, 8GB".to_string(),
            image: "https://img/cover.png".to_string(),
            images: vec![],
            interests: vec!["bike".to_string()],
            opportunities: vec![],
            price: 1500.0,
            category_id: "tech".to_string(),
            user_id: "u-1".to_string(),
            status: ListingStatus::Active,
            created_at: at,
            updated_at: at,
            category_name: Some("Tecnologia".to_string()),
            owner: None,
        }
    }

    #[test]
    fn test_toggle_flips_status_only() {
        let active = sample_listing();
        let inactive = active.toggled();

        assert_eq!(inactive.status, ListingStatus::Inactive);
        assert_eq!(inactive.toggled(), active);
        assert_eq!(
            Listing {
                status: ListingStatus::Active,
                ..inactive.clone()
            },
            active
        );
    }

    #[test]
    fn test_display_images_falls_back_to_cover() {
        let mut listing = sample_listing();
        assert_eq!(listing.display_images(), vec!["https://img/cover.png"]);

        listing.images = vec!["https://img/1.png".to_string(), "https://img/2.png".to_string()];
        assert_eq!(
            listing.display_images(),
            vec!["https://img/1.png", "https://img/2.png"]
        );
    }

    #[test]
    fn test_status_wire_codes() {
        assert_eq!(serde_json::to_string(&ListingStatus::Active).unwrap(), "\"A\"");
        assert_eq!(ListingStatus::from_code("I"), Some(ListingStatus::Inactive));
        assert_eq!(ListingStatus::from_code("X"), None);
    }

    #[test]
    fn test_listing_changes_skip_absent_fields() {
        let changes = ListingChanges::status(ListingStatus::Inactive);
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({"status": "I"}));
        assert!(ListingChanges::default().is_empty());
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::Any);
        assert_eq!(
            "Active".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(ListingStatus::Active)
        );
        assert!("sold".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_criteria_active_filters_and_clear() {
        let mut criteria = FilterCriteria {
            search_term: "note".to_string(),
            category_id: Some(String::new()),
            status: StatusFilter::Any,
        };
        assert!(criteria.has_active_filters());

        criteria.clear();
        assert!(!criteria.has_active_filters());

        criteria.category_id = Some(String::new());
        assert!(!criteria.has_active_filters());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let session = Session {
            access_token: "t".to_string(),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: Some(now),
            user: User {
                id: "u-1".to_string(),
                email: None,
            },
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - chrono::Duration::seconds(1)));
    }
}
