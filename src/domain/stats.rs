//! Single-pass statistics over transactions and asset movements.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use itertools::Itertools;

use crate::domain::entities::{present, AssetMovementRecord, FieldValue, TransactionRecord};
use crate::domain::format::DisplayFormat;

/// Count per category, categories in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, category: String) {
        match self.index.get(&category) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(category.clone(), self.entries.len());
                self.entries.push((category, 1));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.index.get(category).map(|&pos| self.entries[pos].1)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// The `n` largest categories, count descending; ties keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        self.entries
            .iter()
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .take(n)
            .map(|(k, c)| (k.as_str(), *c))
            .collect()
    }
}

/// Earliest and latest timestamp of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Shared part of both aggregations: count, numeric total, distinct assets, times.
#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    total: f64,
    assets: HashSet<String>,
    times: Vec<DateTime<FixedOffset>>,
}

impl Accumulator {
    fn observe(
        &mut self,
        amount: &Option<FieldValue>,
        asset: &Option<FieldValue>,
        time: &Option<FieldValue>,
        format: &dyn DisplayFormat,
    ) {
        self.count += 1;
        if let Some(value) = present(amount).and_then(FieldValue::as_f64) {
            self.total += value;
        }
        if let Some(asset) = present(asset) {
            self.assets.insert(asset.to_string());
        }
        if let Some(at) = present(time).and_then(|t| format.parse_time(t)) {
            self.times.push(at);
        }
    }

    fn time_range(&self) -> Option<TimeRange> {
        let (start, end) = self.times.iter().minmax().into_option()?;
        Some(TimeRange {
            start: *start,
            end: *end,
        })
    }
}

fn category(field: &Option<FieldValue>) -> Option<String> {
    present(field).map(|v| v.to_string())
}

/// Summary of the `transactions` list.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStats {
    pub total_count: usize,
    pub total_amount: f64,
    pub unique_assets: usize,
    pub time_range: Option<TimeRange>,
    pub type_distribution: Distribution,
    pub asset_distribution: Distribution,
}

impl TransactionStats {
    pub fn collect(transactions: &[TransactionRecord], format: &dyn DisplayFormat) -> Self {
        let mut acc = Accumulator::default();
        let mut type_distribution = Distribution::new();
        let mut asset_distribution = Distribution::new();

        for tx in transactions {
            acc.observe(&tx.total_amount, &tx.base_asset, &tx.transaction_time, format);
            if let Some(asset) = category(&tx.base_asset) {
                asset_distribution.record(asset);
            }
            if let Some(kind) = category(&tx.transaction_type) {
                type_distribution.record(kind);
            }
        }

        Self {
            total_count: acc.count,
            total_amount: acc.total,
            unique_assets: acc.assets.len(),
            time_range: acc.time_range(),
            type_distribution,
            asset_distribution,
        }
    }
}

/// Summary of the `asset_movements` list.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMovementStats {
    pub total_count: usize,
    pub total_quantity: f64,
    pub unique_assets: usize,
    pub time_range: Option<TimeRange>,
    pub direction_distribution: Distribution,
    pub network_distribution: Distribution,
}

impl AssetMovementStats {
    pub fn collect(movements: &[AssetMovementRecord], format: &dyn DisplayFormat) -> Self {
        let mut acc = Accumulator::default();
        let mut direction_distribution = Distribution::new();
        let mut network_distribution = Distribution::new();

        for mv in movements {
            acc.observe(&mv.quantity, &mv.asset, &mv.transaction_time, format);
            if let Some(direction) = category(&mv.direction) {
                direction_distribution.record(direction);
            }
            if let Some(network) = category(&mv.network) {
                network_distribution.record(network);
            }
        }

        Self {
            total_count: acc.count,
            total_quantity: acc.total,
            unique_assets: acc.assets.len(),
            time_range: acc.time_range(),
            direction_distribution,
            network_distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tied_counts_when_taking_top_then_keeps_first_seen_order() {
        let mut dist = Distribution::new();
        for key in ["b", "a", "c", "a", "c"] {
            dist.record(key.to_string());
        }

        assert_eq!(dist.top(3), vec![("a", 2), ("c", 2), ("b", 1)]);
        assert_eq!(dist.top(1), vec![("a", 2)]);
        assert_eq!(dist.total(), 5);
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn given_records_when_counting_then_preserves_insertion_order() {
        let mut dist = Distribution::new();
        for key in ["BUY", "SELL", "BUY"] {
            dist.record(key.to_string());
        }

        assert_eq!(
            dist.entries(),
            &[("BUY".to_string(), 2), ("SELL".to_string(), 1)]
        );
        assert_eq!(dist.get("SELL"), Some(1));
        assert_eq!(dist.get("HOLD"), None);
    }
}
