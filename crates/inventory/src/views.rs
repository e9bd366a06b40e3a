//! Derived views over a snapshot of records.
//!
//! Everything here is a pure function of its input: no IO, no shared state.
//! Views are recomputed from scratch for every snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::InventoryRecord;

/// Records at or below this quantity are flagged as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Category selection for the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Exact, case-sensitive category match.
    Category(String),
}

impl CategoryFilter {
    /// Label used for the "no restriction" entry.
    pub const ALL_LABEL: &'static str = "All";

    /// Map a dropdown label back to a filter.
    pub fn from_selection(label: &str) -> Self {
        if label == Self::ALL_LABEL {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => Self::ALL_LABEL,
            CategoryFilter::Category(c) => c,
        }
    }

    pub fn matches(&self, record: &InventoryRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(c) => record.category == *c,
        }
    }
}

impl core::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub records: usize,
    pub quantity: u64,
    pub value: f64,
}

/// Aggregate statistics over a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryStatistics {
    pub unique_count: usize,
    pub total_value: f64,
    pub total_quantity: u64,
    /// Records with `quantity <= threshold`.
    pub low_stock: Vec<InventoryRecord>,
    /// Records with `quantity == 0`; always a subset of `low_stock`.
    pub out_of_stock: Vec<InventoryRecord>,
    pub by_category: BTreeMap<String, CategorySummary>,
}

/// Keep the records matching `selected`, preserving input order.
pub fn filter_by_category(
    records: &[InventoryRecord],
    selected: &CategoryFilter,
) -> Vec<InventoryRecord> {
    records
        .iter()
        .filter(|r| selected.matches(r))
        .cloned()
        .collect()
}

/// `All` followed by every distinct category in `records`.
///
/// Categories are deduplicated and sorted; callers should still treat the
/// result as a set.
pub fn distinct_categories(records: &[InventoryRecord]) -> Vec<CategoryFilter> {
    let categories: BTreeSet<&str> = records.iter().map(|r| r.category.as_str()).collect();

    let mut out = Vec::with_capacity(categories.len() + 1);
    out.push(CategoryFilter::All);
    out.extend(
        categories
            .into_iter()
            .map(|c| CategoryFilter::Category(c.to_string())),
    );
    out
}

/// Fold a snapshot into [`InventoryStatistics`].
pub fn compute_statistics(records: &[InventoryRecord], low_stock_threshold: u32) -> InventoryStatistics {
    let mut stats = InventoryStatistics {
        unique_count: records.len(),
        ..InventoryStatistics::default()
    };

    for record in records {
        let value = record.stock_value();
        stats.total_value += value;
        stats.total_quantity += u64::from(record.quantity);

        if record.quantity <= low_stock_threshold {
            stats.low_stock.push(record.clone());
        }
        if record.is_out_of_stock() {
            stats.out_of_stock.push(record.clone());
        }

        let summary = stats.by_category.entry(record.category.clone()).or_default();
        summary.records += 1;
        summary.quantity += u64::from(record.quantity);
        summary.value += value;
    }

    stats
}

/// Display order: newest first, ties broken by id.
pub fn sort_newest_first(records: &mut [InventoryRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
