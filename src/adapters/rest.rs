//! Listing and category repositories over the hosted REST data API.
//!
//! Rows are decoded into explicit wire structs and converted with `TryFrom`,
//! so malformed rows are rejected here instead of leaking into the core.

use crate::adapters::http::{check_status, BackendClient};
use crate::domain::model::{
    Category, Listing, ListingChanges, ListingStatus, NewListing, Owner,
};
use crate::domain::ports::{CategoryRepository, ListingRepository};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const LISTINGS_TABLE: &str = "orders";
pub const CATEGORIES_TABLE: &str = "categories";
pub const LISTING_SELECT: &str = "*,categories(name),users(name,email)";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedCategory {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingRow {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub opportunities: Option<Vec<String>>,
    pub price: f64,
    pub category_id: Option<String>,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Option<EmbeddedCategory>,
    pub users: Option<EmbeddedUser>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = MarketError;

    fn try_from(row: ListingRow) -> Result<Self> {
        if row.id.trim().is_empty() {
            return Err(invalid_row("listing row without id"));
        }

        let status = ListingStatus::from_code(&row.status).ok_or_else(|| {
            invalid_row(&format!("listing {} has unknown status '{}'", row.id, row.status))
        })?;

        if !row.price.is_finite() || row.price < 0.0 {
            return Err(invalid_row(&format!(
                "listing {} has invalid price {}",
                row.id, row.price
            )));
        }

        let owner = row.users.and_then(|u| match (u.name, u.email) {
            (None, None) => None,
            (name, email) => Some(Owner {
                name: name.unwrap_or_default(),
                email: email.unwrap_or_default(),
            }),
        });

        Ok(Listing {
            id: row.id,
            title: row.title.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            image: row.image.unwrap_or_default(),
            images: row.images.unwrap_or_default(),
            interests: row.interests.unwrap_or_default(),
            opportunities: row.opportunities.unwrap_or_default(),
            price: row.price,
            category_id: row.category_id.unwrap_or_default(),
            user_id: row.user_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category_name: row.categories.and_then(|c| c.name),
            owner,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = MarketError;

    fn try_from(row: CategoryRow) -> Result<Self> {
        let name = row.name.unwrap_or_default();
        if row.id.trim().is_empty() || name.trim().is_empty() {
            return Err(invalid_row("category row without id or name"));
        }
        Ok(Category {
            id: row.id,
            name,
            created_at: row.created_at,
        })
    }
}

fn invalid_row(message: &str) -> MarketError {
    MarketError::BackendError {
        status: 502,
        message: format!("Malformed row from data store: {}", message),
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Array literal for the `ov` (overlap) operator; every element is quoted.
fn array_literal(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Thin typed access to one table.
#[derive(Debug, Clone)]
struct Table {
    backend: BackendClient,
    name: &'static str,
    access_token: Option<String>,
}

impl Table {
    fn path(&self) -> String {
        format!("/rest/v1/{}", self.name)
    }

    fn request(&self, method: Method) -> reqwest::RequestBuilder {
        self.backend
            .request(method, &self.path(), self.access_token.as_deref())
    }

    async fn select_many<R: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<Vec<R>> {
        let response = self.request(Method::GET).query(params).send().await?;
        let rows: Vec<R> = check_status(response).await?.json().await?;
        tracing::debug!(table = self.name, rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    async fn select_one<R: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<R> {
        let response = self
            .request(Method::GET)
            .header("Accept", SINGLE_OBJECT)
            .query(params)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = MarketError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct SupabaseListings {
    table: Table,
}

impl SupabaseListings {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            table: Table {
                backend,
                name: LISTINGS_TABLE,
                access_token: None,
            },
        }
    }

    /// Row-level security in the store decides what this user may change.
    pub fn with_access_token(mut self, access_token: &str) -> Self {
        self.table.access_token = Some(access_token.to_string());
        self
    }

    async fn list_where(&self, filters: Vec<(&str, String)>, order: &str) -> Result<Vec<Listing>> {
        let mut params = vec![("select", LISTING_SELECT.to_string())];
        params.extend(filters);
        params.push(("order", order.to_string()));

        let rows: Vec<ListingRow> = self.table.select_many(&params).await?;
        convert_all(rows)
    }

    async fn write_one<B: serde::Serialize + Sync>(
        &self,
        method: Method,
        filters: Vec<(&str, String)>,
        body: &B,
    ) -> Result<Listing> {
        let mut params = filters;
        params.push(("select", LISTING_SELECT.to_string()));

        let response = self
            .table
            .request(method)
            .header("Prefer", RETURN_REPRESENTATION)
            .header("Accept", SINGLE_OBJECT)
            .query(&params)
            .json(body)
            .send()
            .await?;
        let row: ListingRow = check_status(response).await?.json().await?;
        Listing::try_from(row)
    }
}

#[async_trait]
impl ListingRepository for SupabaseListings {
    async fn list(&self) -> Result<Vec<Listing>> {
        self.list_where(vec![], "created_at.desc").await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Listing>> {
        self.list_where(vec![("user_id", eq(user_id))], "created_at.desc")
            .await
    }

    async fn list_by_category(&self, category_id: &str) -> Result<Vec<Listing>> {
        self.list_where(
            vec![
                ("category_id", eq(category_id)),
                ("status", eq(ListingStatus::Active.code())),
            ],
            "created_at.desc",
        )
        .await
    }

    async fn list_by_status(&self, status: ListingStatus) -> Result<Vec<Listing>> {
        self.list_where(vec![("status", eq(status.code()))], "created_at.desc")
            .await
    }

    async fn list_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Listing>> {
        if min > max {
            return Err(MarketError::validation(format!(
                "Minimum price {} is above maximum {}",
                min, max
            )));
        }
        self.list_where(
            vec![
                ("price", format!("gte.{}", min)),
                ("price", format!("lte.{}", max)),
                ("status", eq(ListingStatus::Active.code())),
            ],
            "price.asc",
        )
        .await
    }

    async fn list_by_interests(&self, interests: &[String]) -> Result<Vec<Listing>> {
        if interests.is_empty() {
            return Ok(Vec::new());
        }
        self.list_where(
            vec![
                ("interests", format!("ov.{}", array_literal(interests))),
                ("status", eq(ListingStatus::Active.code())),
            ],
            "created_at.desc",
        )
        .await
    }

    async fn get(&self, id: &str) -> Result<Listing> {
        let row: ListingRow = self
            .table
            .select_one(&[("select", LISTING_SELECT.to_string()), ("id", eq(id))])
            .await?;
        Listing::try_from(row)
    }

    async fn create(&self, listing: &NewListing) -> Result<Listing> {
        self.write_one(Method::POST, vec![], listing).await
    }

    async fn update(&self, id: &str, changes: &ListingChanges) -> Result<Listing> {
        if changes.is_empty() {
            return Err(MarketError::validation("Nothing to update"));
        }
        self.write_one(Method::PATCH, vec![("id", eq(id))], changes)
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .table
            .request(Method::DELETE)
            .query(&[("id", eq(id))])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseCategories {
    table: Table,
}

impl SupabaseCategories {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            table: Table {
                backend,
                name: CATEGORIES_TABLE,
                access_token: None,
            },
        }
    }

    pub fn with_access_token(mut self, access_token: &str) -> Self {
        self.table.access_token = Some(access_token.to_string());
        self
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Category> {
        let row: CategoryRow = self
            .table
            .select_one(&[("select", "*".to_string()), (column, eq(value))])
            .await?;
        Category::try_from(row)
    }
}

#[async_trait]
impl CategoryRepository for SupabaseCategories {
    async fn list(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = self
            .table
            .select_many(&[
                ("select", "*".to_string()),
                ("order", "name.asc".to_string()),
            ])
            .await?;
        convert_all(rows)
    }

    async fn get(&self, id: &str) -> Result<Category> {
        self.find_one("id", id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Category> {
        self.find_one("name", name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_json() -> serde_json::Value {
        serde_json::json!({
            "id": "l-1",
            "title": "Notebook",
            "description": "Dell",
            "image": "https://cdn/1.png",
            "images": null,
            "interests": ["bike"],
            "opportunities": null,
            "price": 1500.5,
            "category_id": "tech",
            "user_id": "u-1",
            "status": "A",
            "created_at": "2025-09-01T12:00:00.123456+00:00",
            "updated_at": "2025-09-01T12:00:00+00:00",
            "categories": {"name": "Tecnologia"},
            "users": {"name": "Ana", "email": "ana@example.com"}
        })
    }

    #[test]
    fn test_listing_row_conversion() {
        let row: ListingRow = serde_json::from_value(row_json()).unwrap();
        let listing = Listing::try_from(row).unwrap();

        assert_eq!(listing.status, ListingStatus::Active);
        assert!(listing.images.is_empty());
        assert!(listing.opportunities.is_empty());
        assert_eq!(listing.category_name.as_deref(), Some("Tecnologia"));
        assert_eq!(listing.owner.unwrap().name, "Ana");
    }

    #[test]
    fn test_listing_row_rejects_unknown_status() {
        let mut json = row_json();
        json["status"] = serde_json::json!("X");
        let row: ListingRow = serde_json::from_value(json).unwrap();
        assert!(matches!(
            Listing::try_from(row),
            Err(MarketError::BackendError { .. })
        ));
    }

    #[test]
    fn test_listing_row_rejects_negative_price() {
        let mut json = row_json();
        json["price"] = serde_json::json!(-1.0);
        let row: ListingRow = serde_json::from_value(json).unwrap();
        assert!(Listing::try_from(row).is_err());
    }

    #[test]
    fn test_category_row_requires_name() {
        let row: CategoryRow = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "name": null,
            "created_at": "2025-09-01T12:00:00+00:00"
        }))
        .unwrap();
        assert!(Category::try_from(row).is_err());
    }

    #[test]
    fn test_array_literal_quotes_items() {
        let values = vec!["bike".to_string(), "mesa, cadeira".to_string()];
        assert_eq!(array_literal(&values), r#"{"bike","mesa, cadeira"}"#);
    }
}
