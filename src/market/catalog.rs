// Catalog construction: per-stat enumeration, join, and ordering.

use crate::error::MarketError;
use crate::market::models::{sort_records, ItemMeta, MateriaRecord, COLOR_STATS};
use crate::market::prices::fetch_prices;
use crate::market::scrip::fetch_scrip_costs;
use crate::market::MarketConfig;
use crate::transport::{TimingReport, Transport, UpstreamClient};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const STAT_QUERY_FIELDS: &str = "Item[].Name,Item[].value,Value";

/// Builds the full materia view for one world.
///
/// Owns a fresh `UpstreamClient` so each build carries its own timing sheet;
/// construct one per request.
pub struct CatalogBuilder {
    client: UpstreamClient,
    cfg: MarketConfig,
}

impl CatalogBuilder {
    pub fn new(transport: Arc<dyn Transport>, cfg: MarketConfig) -> Self {
        Self {
            client: UpstreamClient::new(transport),
            cfg,
        }
    }

    /// Timing snapshot for everything fetched through this builder.
    pub fn timing_report(&self) -> TimingReport {
        self.client.report()
    }

    fn stat_query_url(cfg: &MarketConfig, stat: &str) -> String {
        format!(
            "{}/search?query={}&sheets=Materia&limit=500&fields={}",
            cfg.xivapi_url,
            urlencoding::encode(&format!("BaseParam.Name~\"{stat}\"")),
            urlencoding::encode(STAT_QUERY_FIELDS),
        )
    }

    /// Enumerate (stat, item) candidates from the static stat table.
    ///
    /// Only the first result row per stat query is considered. An item that
    /// matches several stat queries keeps the last-processed stat: the
    /// `IndexMap` upsert replaces the value but keeps the original discovery
    /// position, so output order stays stable across overwrites.
    async fn discover_items(&self) -> Result<IndexMap<u32, ItemMeta>, MarketError> {
        let mut catalog: IndexMap<u32, ItemMeta> = IndexMap::new();
        for (color, stats) in COLOR_STATS {
            for stat in *stats {
                let url = Self::stat_query_url(&self.cfg, stat);
                let res = self.client.fetch("XIVAPI Stat Query", &url).await?;
                let Some(row) = res
                    .get("results")
                    .and_then(Value::as_array)
                    .and_then(|rows| rows.first())
                else {
                    continue;
                };
                let Some(fields) = row.get("fields") else {
                    continue;
                };
                let items = fields
                    .get("Item")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let values = fields
                    .get("Value")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                for (idx, item) in items.iter().enumerate() {
                    let item_id = item.get("value").and_then(Value::as_u64).unwrap_or(0);
                    let name = item
                        .get("fields")
                        .and_then(|f| f.get("Name"))
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    let Some(increase) = values.get(idx).and_then(Value::as_i64) else {
                        continue;
                    };
                    if item_id == 0 || name.is_empty() {
                        continue;
                    }
                    catalog.insert(
                        item_id as u32,
                        ItemMeta {
                            name: name.to_string(),
                            stat: stat.to_string(),
                            stat_increase: increase,
                            color: color.to_string(),
                            meldable: true,
                        },
                    );
                }
            }
        }
        Ok(catalog)
    }

    /// Full pipeline for one world.
    ///
    /// Stat enumeration and scrip resolution are fatal; the price fetch
    /// degrades to null price fields per item.
    pub async fn build(&self, world: &str) -> Result<Vec<MateriaRecord>, MarketError> {
        let catalog = self.discover_items().await?;
        info!(world, items = catalog.len(), "catalog enumeration complete");

        let item_ids: Vec<u32> = catalog.keys().copied().collect();
        let prices = fetch_prices(&self.client, &self.cfg, world, &item_ids).await;
        let scrip_costs = fetch_scrip_costs(&self.client, &self.cfg).await?;

        let mut records: Vec<MateriaRecord> = catalog
            .iter()
            .map(|(id, meta)| MateriaRecord::join(*id, meta, prices.get(id), scrip_costs.get(id)))
            .collect();
        sort_records(&mut records);
        Ok(records)
    }
}
