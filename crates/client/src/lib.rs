//! `stockroom-client`
//!
//! **Responsibility:** view-model layer of the stock-keeping app.
//!
//! This crate provides:
//! - Environment-driven configuration and store selection
//! - An inventory controller that follows the live record feed and keeps the
//!   derived views (filtered list, categories, statistics) current
//! - Add/edit/delete entry points that validate form input before any store call
//!
//! Rendering is left to whatever UI layer consumes [`InventoryView`].

pub mod config;
pub mod controller;
pub mod view;

pub use config::{ClientConfig, ConfigError, StoreBackend};
pub use controller::{ControllerError, InventoryController};
pub use view::InventoryView;
