use crate::core::listing_filter;
use crate::core::price_mask;
use crate::domain::model::{Category, FilterCriteria, Listing, ListingStatus, NewListing, User};
use crate::domain::ports::{CategoryRepository, ListingRepository};
use crate::utils::error::{MarketError, Result};
use std::collections::HashMap;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200";
pub const UNCATEGORIZED: &str = "Sem categoria";

/// Raw form input for a new listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    /// Comma-separated, as typed.
    pub interests: String,
    pub opportunities: String,
    /// Masked price input (`R$ 1.234,56` or bare digits in cents).
    pub price: String,
    pub category_id: String,
}

impl ListingDraft {
    pub fn into_new_listing(self, user: &User, max_images: usize) -> Result<NewListing> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(MarketError::validation("Title is required"));
        }

        let category_id = self.category_id.trim().to_string();
        if category_id.is_empty() {
            return Err(MarketError::validation("Choose a category"));
        }

        if self.images.len() > max_images {
            return Err(MarketError::TooManyImages {
                max: max_images,
                requested: self.images.len(),
            });
        }

        let price = if self.price.trim().is_empty() {
            0.0
        } else {
            price_mask::parse_display(&self.price)?
        };

        let image = self
            .images
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        Ok(NewListing {
            title,
            description: self.description.trim().to_string(),
            image,
            images: self.images,
            interests: split_list(&self.interests),
            opportunities: split_list(&self.opportunities),
            price,
            category_id,
            user_id: user.id.clone(),
            status: ListingStatus::Active,
        })
    }
}

/// 以逗號分隔，去除空白與空項目
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub listings: Vec<Listing>,
    pub categories: Vec<Category>,
    pub total: usize,
    pub has_active_filters: bool,
}

pub struct Marketplace<L: ListingRepository, C: CategoryRepository> {
    listings: L,
    categories: C,
    max_images: usize,
}

impl<L: ListingRepository, C: CategoryRepository> Marketplace<L, C> {
    pub fn new(listings: L, categories: C, max_images: usize) -> Self {
        Self {
            listings,
            categories,
            max_images,
        }
    }

    pub fn listings(&self) -> &L {
        &self.listings
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.categories.list().await
    }

    /// Loads everything, then filters client-side.
    pub async fn feed(&self, criteria: &FilterCriteria) -> Result<FeedPage> {
        let all = self.listings.list().await?;
        let categories = self.categories.list().await?;
        tracing::debug!(
            listings = all.len(),
            categories = categories.len(),
            "feed loaded"
        );

        let mut listings = listing_filter::filter(&all, criteria);
        resolve_category_names(&mut listings, &categories);

        Ok(FeedPage {
            total: all.len(),
            listings,
            categories,
            has_active_filters: criteria.has_active_filters(),
        })
    }

    pub async fn my_listings(&self, user: &User) -> Result<Vec<Listing>> {
        let mut listings = self.listings.list_by_user(&user.id).await?;
        let categories = self.categories.list().await?;
        resolve_category_names(&mut listings, &categories);
        Ok(listings)
    }

    pub async fn create_listing(&self, user: &User, draft: ListingDraft) -> Result<Listing> {
        let new_listing = draft.into_new_listing(user, self.max_images)?;
        let created = self.listings.create(&new_listing).await?;
        tracing::info!("✅ Listing {} created", created.id);
        Ok(created)
    }

    pub async fn toggle_status(&self, listing: &Listing) -> Result<Listing> {
        let next = listing.status.toggled();
        let updated = self.listings.update_status(&listing.id, next).await?;
        tracing::info!("🔁 Listing {} is now {}", updated.id, updated.status);
        Ok(updated)
    }

    /// Looks the listing up first so the toggle starts from the stored status.
    pub async fn toggle_status_by_id(&self, id: &str) -> Result<Listing> {
        let listing = self.listings.get(id).await?;
        self.toggle_status(&listing).await
    }

    pub async fn delete_listing(&self, id: &str) -> Result<()> {
        self.listings.delete(id).await?;
        tracing::info!("🗑️ Listing {} deleted", id);
        Ok(())
    }
}

fn resolve_category_names(listings: &mut [Listing], categories: &[Category]) {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    for listing in listings.iter_mut() {
        if listing.category_name.is_none() {
            let name = names
                .get(listing.category_id.as_str())
                .copied()
                .unwrap_or(UNCATEGORIZED);
            listing.category_name = Some(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: Some("ana@example.com".to_string()),
        }
    }

    fn draft() -> ListingDraft {
        ListingDraft {
            title: "  Bicicleta aro 29 ".to_string(),
            description: "Pouco usada".to_string(),
            images: vec![],
            interests: "notebook, , livros ".to_string(),
            opportunities: "".to_string(),
            price: "R$ 1.250,00".to_string(),
            category_id: "sport".to_string(),
        }
    }

    #[test]
    fn test_draft_conversion() {
        let listing = draft().into_new_listing(&user(), 5).unwrap();

        assert_eq!(listing.title, "Bicicleta aro 29");
        assert_eq!(listing.price, 1250.0);
        assert_eq!(listing.interests, vec!["notebook", "livros"]);
        assert!(listing.opportunities.is_empty());
        assert_eq!(listing.image, PLACEHOLDER_IMAGE);
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.user_id, "u-1");
    }

    #[test]
    fn test_first_image_becomes_cover() {
        let mut d = draft();
        d.images = vec!["https://cdn/1.png".to_string(), "https://cdn/2.png".to_string()];
        let listing = d.into_new_listing(&user(), 5).unwrap();
        assert_eq!(listing.image, "https://cdn/1.png");
        assert_eq!(listing.images.len(), 2);
    }

    #[test]
    fn test_draft_validation() {
        let mut no_title = draft();
        no_title.title = "   ".to_string();
        assert!(no_title.into_new_listing(&user(), 5).is_err());

        let mut no_category = draft();
        no_category.category_id.clear();
        assert!(no_category.into_new_listing(&user(), 5).is_err());

        let mut bad_price = draft();
        bad_price.price = "abc".to_string();
        assert!(matches!(
            bad_price.into_new_listing(&user(), 5),
            Err(MarketError::InvalidPrice { .. })
        ));

        let mut too_many = draft();
        too_many.images = vec!["x".to_string(); 6];
        assert!(matches!(
            too_many.into_new_listing(&user(), 5),
            Err(MarketError::TooManyImages { .. })
        ));
    }

    #[test]
    fn test_blank_price_means_zero() {
        let mut d = draft();
        d.price = String::new();
        assert_eq!(d.into_new_listing(&user(), 5).unwrap().price, 0.0);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b ,c"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
        assert!(split_list(" , ").is_empty());
    }
}
