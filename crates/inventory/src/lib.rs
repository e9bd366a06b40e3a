//! Inventory domain module.
//!
//! This crate contains the inventory record model and the derived views
//! computed from a snapshot of records, implemented purely as deterministic
//! logic (no IO, no storage).

pub mod form;
pub mod record;
pub mod views;

pub use form::{ItemFields, ItemForm};
pub use record::{InventoryRecord, MalformedRecord, fields};
pub use views::{
    CategoryFilter, CategorySummary, DEFAULT_LOW_STOCK_THRESHOLD, InventoryStatistics,
    compute_statistics, distinct_categories, filter_by_category, sort_newest_first,
};
