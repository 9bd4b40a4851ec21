pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::AppConfig};

#[cfg(feature = "cli")]
pub use app::commands::App;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{
    listing_filter::filter, marketplace::Marketplace, price_mask::PriceMask,
    session::SessionGateway,
};
pub use utils::error::{MarketError, Result};
