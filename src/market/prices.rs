// Price aggregation against the Universalis batch endpoint.

use crate::error::MarketError;
use crate::market::models::{Listing, ListingSummary};
use crate::market::MarketConfig;
use crate::transport::UpstreamClient;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Upstream batch-size limit on comma-joined item ids.
const BATCH_SIZE: usize = 100;

/// Per-item payload inside a Universalis batch response.
#[derive(Debug, Deserialize)]
struct ItemData {
    #[serde(default)]
    listings: Vec<Listing>,
    #[serde(default, rename = "recentHistory")]
    recent_history: Vec<SaleEntry>,
}

/// One completed sale from the recent-history array.
#[derive(Debug, Deserialize)]
struct SaleEntry {
    #[serde(rename = "pricePerUnit")]
    price_per_unit: u64,
    quantity: u64,
}

/// Batched price fetch for one world.
///
/// Failures here are non-fatal: whatever was summarized before the failure
/// is returned, and absent items surface as null price fields downstream.
pub async fn fetch_prices(
    client: &UpstreamClient,
    cfg: &MarketConfig,
    world: &str,
    item_ids: &[u32],
) -> IndexMap<u32, ListingSummary> {
    let mut prices = IndexMap::new();
    if item_ids.is_empty() {
        return prices;
    }
    if let Err(err) = fetch_price_batches(client, cfg, world, item_ids, &mut prices).await {
        warn!(world, error = %err, "price fetch degraded; continuing with partial data");
    }
    prices
}

async fn fetch_price_batches(
    client: &UpstreamClient,
    cfg: &MarketConfig,
    world: &str,
    item_ids: &[u32],
    prices: &mut IndexMap<u32, ListingSummary>,
) -> Result<(), MarketError> {
    for chunk in item_ids.chunks(BATCH_SIZE) {
        let ids: Vec<String> = chunk.iter().map(u32::to_string).collect();
        let url = format!(
            "{}/{}/{}?listings={}&entries={}",
            cfg.universalis_url,
            world,
            ids.join(","),
            cfg.listings_per_item,
            cfg.history_entries,
        );
        let res = client.fetch("Universalis", &url).await?;
        let Some(items) = res.get("items").and_then(Value::as_object) else {
            continue;
        };
        for (item_id_str, item_data) in items {
            let item_id: u32 = item_id_str.parse().map_err(|_| {
                MarketError::JoinInconsistency(format!("non-numeric item id {item_id_str}"))
            })?;
            let data: ItemData = serde_json::from_value(item_data.clone())?;
            prices.insert(item_id, summarize(data.listings, &data.recent_history)?);
        }
    }
    Ok(())
}

/// Reduce one item's listings and sale history into summary statistics.
///
/// Averages are quantity-weighted floor divisions over ALL listings, not just
/// the ten cheapest kept for display.
fn summarize(mut listings: Vec<Listing>, history: &[SaleEntry]) -> Result<ListingSummary, MarketError> {
    if listings.is_empty() {
        return Ok(ListingSummary::default());
    }

    // Stable sort keeps upstream order among equal prices deterministic.
    listings.sort_by_key(|l| l.price_per_unit);

    let revenue: u64 = listings.iter().map(|l| l.price_per_unit * l.quantity).sum();
    let units: u64 = listings.iter().map(|l| l.quantity).sum();
    if units == 0 {
        return Err(MarketError::JoinInconsistency(
            "listings present but total quantity is zero".into(),
        ));
    }

    let history_revenue: u64 = history.iter().map(|h| h.price_per_unit * h.quantity).sum();
    let history_units: u64 = history.iter().map(|h| h.quantity).sum();
    if history_units == 0 {
        return Err(MarketError::JoinInconsistency(
            "zero sale-history quantity for a listed item".into(),
        ));
    }

    let listing_count = listings.len();
    Ok(ListingSummary {
        average_gil: Some(revenue / units),
        historical_average: Some(history_revenue / history_units),
        listing_count,
        total_quantity: units,
        cheapest_listings: listings.into_iter().take(10).collect(),
    })
}
