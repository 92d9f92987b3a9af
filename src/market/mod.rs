pub mod catalog;
pub mod models;
pub mod prices;
pub mod scrip;

use crate::util::env::{env_opt, env_parse};

/// Upstream endpoints and fetch-depth knobs, shared across the pipeline.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub universalis_url: String,
    pub xivapi_url: String,
    /// Listings requested per item from the price service.
    pub listings_per_item: u32,
    /// Completed-sale entries requested per item.
    pub history_entries: u32,
}

impl MarketConfig {
    pub fn from_env() -> Self {
        crate::util::env::init_env();
        Self {
            universalis_url: env_opt("UNIVERSALIS_URL")
                .unwrap_or_else(|| "https://universalis.app/api/v2".into()),
            xivapi_url: env_opt("XIVAPI_URL")
                .unwrap_or_else(|| "https://v2.xivapi.com/api".into()),
            listings_per_item: env_parse("LISTINGS_PER_ITEM", 50),
            history_entries: env_parse("HISTORY_ENTRIES", 200),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            universalis_url: "https://universalis.app/api/v2".into(),
            xivapi_url: "https://v2.xivapi.com/api".into(),
            listings_per_item: 50,
            history_entries: 200,
        }
    }
}
