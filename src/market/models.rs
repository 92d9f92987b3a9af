// Domain model for the materia market view.

use serde::{Deserialize, Serialize};

/// Stat categories in table order.
///
/// Enumeration walks this table top to bottom; an item matching more than one
/// stat query keeps only the last-processed stat (last write wins).
pub const COLOR_STATS: &[(&str, &[&str])] = &[
    ("Red", &["Critical Hit", "Determination", "Direct Hit Rate"]),
    ("Purple", &["Skill Speed", "Spell Speed"]),
    ("Yellow", &["Tenacity", "Piety"]),
    ("Blue", &["Control", "CP", "Craftsmanship"]),
    ("Green", &["GP", "Gathering", "Perception"]),
];

/// Current price must be at or below this multiple of the historical average
/// for a record to be flagged. Clients apply their own slider on top.
pub const HIGHLIGHT_THRESHOLD: f64 = 1.05;

/// A single active sale offer, exactly as Universalis reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub price_per_unit: u64,
    pub quantity: u64,
    pub world_name: String,
}

/// Per-item reduction of one Universalis batch response.
///
/// An item returned with no listings gets the all-null/zero summary; an item
/// missing from the response entirely gets no summary at all (nulls
/// downstream).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ListingSummary {
    pub average_gil: Option<u64>,
    pub historical_average: Option<u64>,
    pub listing_count: usize,
    pub total_quantity: u64,
    pub cheapest_listings: Vec<Listing>,
}

/// Stat metadata discovered for one item during catalog enumeration.
/// Immutable once built; keyed by item id elsewhere.
#[derive(Debug, Clone)]
pub struct ItemMeta {
    pub name: String,
    pub stat: String,
    pub stat_increase: i64,
    pub color: String,
    pub meldable: bool,
}

/// Scrip purchase option for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyCostEntry {
    pub cost: u64,
    pub scrip_type: String,
}

/// Fully joined record served by the /materia endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MateriaRecord {
    pub id: u32,
    pub name: String,
    pub stat: Option<String>,
    pub stat_increase: Option<i64>,
    pub average_gil: Option<u64>,
    pub scrip_cost: Option<u64>,
    pub gil_per_scrip: Option<u64>,
    pub historical_avg: Option<u64>,
    pub scrip_type: Option<String>,
    pub advanced_melding: Option<bool>,
    pub total_quantity: Option<u64>,
    pub listing_count: Option<usize>,
    pub cheapest_listings: Option<Vec<Listing>>,
    pub color: Option<String>,
    pub highlighted: bool,
}

impl MateriaRecord {
    /// Join metadata with the optional price and scrip overlays.
    ///
    /// `gil_per_scrip` is floor(average / cost), null when either side is
    /// missing or the cost is zero. `highlighted` requires both averages.
    pub fn join(
        id: u32,
        meta: &ItemMeta,
        price: Option<&ListingSummary>,
        scrip: Option<&CurrencyCostEntry>,
    ) -> Self {
        let average_gil = price.and_then(|p| p.average_gil);
        let historical_avg = price.and_then(|p| p.historical_average);
        let scrip_cost = scrip.map(|s| s.cost);

        let gil_per_scrip = match (average_gil, scrip_cost) {
            (Some(avg), Some(cost)) if cost > 0 => Some(avg / cost),
            _ => None,
        };
        let highlighted = matches!(
            (average_gil, historical_avg),
            (Some(avg), Some(hist)) if avg as f64 <= HIGHLIGHT_THRESHOLD * hist as f64
        );

        Self {
            id,
            name: meta.name.clone(),
            stat: Some(meta.stat.clone()),
            stat_increase: Some(meta.stat_increase),
            average_gil,
            scrip_cost,
            gil_per_scrip,
            historical_avg,
            scrip_type: scrip.map(|s| s.scrip_type.clone()),
            advanced_melding: Some(meta.meldable),
            total_quantity: price.map(|p| p.total_quantity),
            listing_count: price.map(|p| p.listing_count),
            cheapest_listings: price.map(|p| p.cheapest_listings.clone()),
            color: Some(meta.color.clone()),
            highlighted,
        }
    }
}

/// Total order over records: stat name ascending, stat bonus descending
/// (missing treated as 0), average price ascending with missing prices last.
/// The sort is stable, so identical inputs always produce identical output.
pub fn sort_records(records: &mut [MateriaRecord]) {
    records.sort_by(|a, b| {
        a.stat
            .cmp(&b.stat)
            .then_with(|| {
                b.stat_increase
                    .unwrap_or(0)
                    .cmp(&a.stat_increase.unwrap_or(0))
            })
            .then_with(|| {
                a.average_gil
                    .unwrap_or(u64::MAX)
                    .cmp(&b.average_gil.unwrap_or(u64::MAX))
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(stat: &str, increase: i64) -> ItemMeta {
        ItemMeta {
            name: format!("{stat} Materia"),
            stat: stat.to_string(),
            stat_increase: increase,
            color: "Red".to_string(),
            meldable: true,
        }
    }

    fn priced(avg: u64, hist: u64) -> ListingSummary {
        ListingSummary {
            average_gil: Some(avg),
            historical_average: Some(hist),
            listing_count: 1,
            total_quantity: 1,
            cheapest_listings: vec![],
        }
    }

    fn record(stat: &str, increase: i64, avg: Option<u64>) -> MateriaRecord {
        let summary = avg.map(|a| priced(a, a));
        MateriaRecord::join(1, &meta(stat, increase), summary.as_ref(), None)
    }

    #[test]
    fn join_without_overlays_yields_nulls_not_exclusion() {
        let rec = MateriaRecord::join(42, &meta("Piety", 10), None, None);
        assert_eq!(rec.id, 42);
        assert_eq!(rec.average_gil, None);
        assert_eq!(rec.scrip_cost, None);
        assert_eq!(rec.gil_per_scrip, None);
        assert_eq!(rec.scrip_type, None);
        assert_eq!(rec.cheapest_listings, None);
        assert!(!rec.highlighted);
        // Metadata fields are still populated normally.
        assert_eq!(rec.stat.as_deref(), Some("Piety"));
        assert_eq!(rec.color.as_deref(), Some("Red"));
    }

    #[test]
    fn gil_per_scrip_is_floor_division_and_null_on_zero_cost() {
        let price = priced(1000, 1000);
        let scrip = CurrencyCostEntry {
            cost: 300,
            scrip_type: "purple".into(),
        };
        let rec = MateriaRecord::join(1, &meta("Control", 5), Some(&price), Some(&scrip));
        assert_eq!(rec.gil_per_scrip, Some(3));

        let free = CurrencyCostEntry {
            cost: 0,
            scrip_type: "purple".into(),
        };
        let rec = MateriaRecord::join(1, &meta("Control", 5), Some(&price), Some(&free));
        assert_eq!(rec.scrip_cost, Some(0));
        assert_eq!(rec.gil_per_scrip, None);
    }

    #[test]
    fn highlight_boundary_is_inclusive_at_105_percent() {
        let at = MateriaRecord::join(1, &meta("GP", 3), Some(&priced(105, 100)), None);
        assert!(at.highlighted);

        let above = MateriaRecord::join(1, &meta("GP", 3), Some(&priced(106, 100)), None);
        assert!(!above.highlighted);

        let no_history = ListingSummary {
            average_gil: Some(50),
            ..ListingSummary::default()
        };
        let rec = MateriaRecord::join(1, &meta("GP", 3), Some(&no_history), None);
        assert!(!rec.highlighted);
    }

    #[test]
    fn sort_orders_by_stat_then_bonus_desc_then_price_asc() {
        let mut records = vec![
            record("Determination", 12, Some(300)),
            record("Critical Hit", 12, Some(900)),
            record("Critical Hit", 54, Some(500)),
            record("Critical Hit", 54, Some(200)),
            record("Critical Hit", 54, None),
        ];
        sort_records(&mut records);

        let key: Vec<(Option<&str>, i64, Option<u64>)> = records
            .iter()
            .map(|r| (r.stat.as_deref(), r.stat_increase.unwrap_or(0), r.average_gil))
            .collect();
        assert_eq!(
            key,
            vec![
                (Some("Critical Hit"), 54, Some(200)),
                (Some("Critical Hit"), 54, Some(500)),
                (Some("Critical Hit"), 54, None),
                (Some("Critical Hit"), 12, Some(900)),
                (Some("Determination"), 12, Some(300)),
            ]
        );
    }

    #[test]
    fn sort_is_deterministic_under_input_reordering() {
        let mut a = vec![
            record("Piety", 10, Some(100)),
            record("Control", 7, None),
            record("Piety", 10, Some(50)),
            record("Control", 9, Some(75)),
        ];
        let mut b: Vec<MateriaRecord> = a.iter().rev().cloned().collect();

        sort_records(&mut a);
        sort_records(&mut b);

        let view = |rs: &[MateriaRecord]| -> Vec<(Option<String>, Option<i64>, Option<u64>)> {
            rs.iter()
                .map(|r| (r.stat.clone(), r.stat_increase, r.average_gil))
                .collect()
        };
        assert_eq!(view(&a), view(&b));
    }
}
