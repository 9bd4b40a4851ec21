use crate::domain::model::{
    Category, Listing, ListingChanges, ListingStatus, NewListing, Session,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 本機持久化（目前用來保存登入 session）
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn backend_url(&self) -> &str;
    fn anon_key(&self) -> &str;
    fn request_timeout_seconds(&self) -> u64;
    fn bucket(&self) -> &str;
    fn max_file_size_bytes(&self) -> u64;
    fn signed_url_ttl_seconds(&self) -> u64;
    fn max_images(&self) -> usize;
    fn session_dir(&self) -> &str;
}

/// What the auth provider hands back after sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired { email: String },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;
    async fn sign_out(&self, access_token: &str) -> Result<()>;
    async fn reset_password_for_email(&self, email: &str) -> Result<()>;
    async fn update_password(&self, access_token: &str, password: &str) -> Result<()>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Listing>>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Listing>>;
    async fn list_by_category(&self, category_id: &str) -> Result<Vec<Listing>>;
    async fn list_by_status(&self, status: ListingStatus) -> Result<Vec<Listing>>;
    async fn list_by_price_range(&self, min: f64, max: f64) -> Result<Vec<Listing>>;
    async fn list_by_interests(&self, interests: &[String]) -> Result<Vec<Listing>>;
    async fn get(&self, id: &str) -> Result<Listing>;
    async fn create(&self, listing: &NewListing) -> Result<Listing>;
    async fn update(&self, id: &str, changes: &ListingChanges) -> Result<Listing>;
    async fn delete(&self, id: &str) -> Result<()>;

    async fn update_status(&self, id: &str, status: ListingStatus) -> Result<Listing> {
        self.update(id, &ListingChanges::status(status)).await
    }
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>>;
    async fn get(&self, id: &str) -> Result<Category>;
    async fn find_by_name(&self, name: &str) -> Result<Category>;
}

/// Raw object storage: put bytes, hand out signed retrieval links.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, path: &str, content_type: &str, data: Vec<u8>) -> Result<()>;
    async fn create_signed_url(&self, path: &str, expires_in_seconds: u64) -> Result<String>;
}
