// Scrip-cost resolution from the XIVAPI special-shop sheet.

use crate::error::MarketError;
use crate::market::models::CurrencyCostEntry;
use crate::market::MarketConfig;
use crate::transport::UpstreamClient;
use serde_json::Value;
use std::collections::HashMap;

const SHOP_SEARCH_QUERY: &str = "Name~\"Scrip Exchange (Materia)\"";
const SHOP_SEARCH_FIELDS: &str = "Item[].CurrencyCost,Item[].Item[].Name,Name";

pub fn shop_search_url(cfg: &MarketConfig) -> String {
    format!(
        "{}/search?query={}&sheets=SpecialShop&fields={}",
        cfg.xivapi_url,
        urlencoding::encode(SHOP_SEARCH_QUERY),
        urlencoding::encode(SHOP_SEARCH_FIELDS),
    )
}

/// Resolve scrip purchase costs. Single page; no local catch, so a failure
/// here fails the whole request.
pub async fn fetch_scrip_costs(
    client: &UpstreamClient,
    cfg: &MarketConfig,
) -> Result<HashMap<u32, CurrencyCostEntry>, MarketError> {
    let res = client.fetch("XIVAPI Shop Search", &shop_search_url(cfg)).await?;
    Ok(parse_shop_rows(&res))
}

/// Walk shop rows into an item -> cost mapping.
///
/// The scrip-type label is the first whitespace token of the shop's display
/// name, lowercased. Nested item ids and the fixed-size cost array both
/// follow a last-non-zero-wins rule; rows later in the response overwrite
/// earlier ones for duplicate item ids.
fn parse_shop_rows(res: &Value) -> HashMap<u32, CurrencyCostEntry> {
    let mut costs = HashMap::new();
    let Some(rows) = res.get("results").and_then(Value::as_array) else {
        return costs;
    };
    for row in rows {
        let Some(fields) = row.get("fields") else {
            continue;
        };
        let shop = fields
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();
        let Some(items) = fields.get("Item").and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            // Zero nested ids are placeholder slots; the last non-zero wins.
            let mut item_id = 0u64;
            if let Some(subs) = item.get("Item").and_then(Value::as_array) {
                for sub in subs {
                    if let Some(v) = sub.get("value").and_then(Value::as_u64) {
                        if v != 0 {
                            item_id = v;
                        }
                    }
                }
            }
            if item_id == 0 {
                continue;
            }
            let mut cost = 0u64;
            if let Some(cost_slots) = item.get("CurrencyCost").and_then(Value::as_array) {
                for slot in cost_slots {
                    if let Some(v) = slot.as_u64() {
                        if v != 0 {
                            cost = v;
                        }
                    }
                }
            }
            costs.insert(
                item_id as u32,
                CurrencyCostEntry {
                    cost,
                    scrip_type: shop.clone(),
                },
            );
        }
    }
    costs
}
