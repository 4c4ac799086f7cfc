//! Data structures for card state.
//!
//! This module contains the plain data types the card works with:
//! device status and snapshots, temperature history, the food reference
//! table, configuration and chart span selection.

pub mod config;
pub mod food;
pub mod history;
pub mod snapshot;
pub mod span;
pub mod status;

pub use config::{CardConfig, CardEntity, EntityIds};
pub use food::{Category, Doneness, Food, FoodReference, MANUAL};
pub use history::{Sample, Timestamp};
pub use snapshot::DeviceSnapshot;
pub use span::{ChartSpan, SPAN_MINUTES};
pub use status::DeviceStatus;
