//! Render-ready state of the inventory screen.

use serde::Serialize;

use stockroom_infra::RecordSnapshot;
use stockroom_inventory::{
    CategoryFilter, InventoryRecord, InventoryStatistics, compute_statistics,
    distinct_categories, filter_by_category, sort_newest_first,
};

/// Everything a rendering layer needs for the list, dropdown and statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryView {
    /// `false` until the first snapshot arrives.
    pub loaded: bool,
    /// All records, newest first.
    pub records: Vec<InventoryRecord>,
    /// Records passing the current filter, newest first.
    pub visible: Vec<InventoryRecord>,
    /// Dropdown entries: `All` followed by each category present.
    pub categories: Vec<CategoryFilter>,
    pub filter: CategoryFilter,
    pub statistics: InventoryStatistics,
    /// Documents left out because they could not be decoded.
    pub rejected: usize,
}

impl InventoryView {
    /// Recompute every derived view from one snapshot.
    pub fn compute(snapshot: &RecordSnapshot, filter: CategoryFilter, low_stock_threshold: u32) -> Self {
        let mut records = snapshot.records.clone();
        sort_newest_first(&mut records);

        Self {
            loaded: true,
            visible: filter_by_category(&records, &filter),
            categories: distinct_categories(&records),
            statistics: compute_statistics(&records, low_stock_threshold),
            filter,
            rejected: snapshot.rejected.len(),
            records,
        }
    }

    pub fn find(&self, name: &str) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}
