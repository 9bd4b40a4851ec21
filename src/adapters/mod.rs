// Adapters layer: concrete implementations of the domain ports against the
// hosted backend (auth, REST data API, object storage).

pub mod auth;
pub mod http;
pub mod rest;
pub mod storage;

pub use auth::SupabaseAuth;
pub use http::BackendClient;
pub use rest::{SupabaseCategories, SupabaseListings};
pub use storage::SupabaseStorage;
