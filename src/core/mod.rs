pub mod auth_flow;
pub mod listing_filter;
pub mod marketplace;
pub mod media;
pub mod price_mask;
pub mod session;

pub use crate::domain::model::{Category, FilterCriteria, Listing, ListingStatus, Session, User};
pub use crate::domain::ports::{
    AuthProvider, CategoryRepository, ConfigProvider, ListingRepository, ObjectStore, Storage,
};
pub use crate::utils::error::Result;
