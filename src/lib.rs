//! # cooker-card
//!
//! The core of a live dashboard card for a remote cooking probe.
//!
//! The card shows the probe's connection status, core/target/ambient
//! temperatures, cook progress and a rolling temperature chart, and lets the
//! user pick a food and doneness preset or a manual target. This crate holds
//! everything except the drawing itself:
//!
//! - **Backend sync** ([`reconciler`]): detects when the food/doneness
//!   selection changed on the device and updates the selectors without
//!   overwriting the user's own edits on unrelated updates
//! - **Chart window engine** ([`chart`]): auto-scaling time window and the
//!   actual, target, projection and ambient series
//! - **Render state machine** ([`render`]): the per-status visibility and
//!   formatting rules, producing a [`CardView`]
//! - **Card controller** ([`controller`]): wires the above to the telemetry
//!   source, the command sink, the translation provider and the chart host
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cooker_card::controller::{CardController, CardEvent, Collaborators};
//! use cooker_card::source::{MemoryTelemetry, MemoryTranslations, RecordingSink};
//! use cooker_card::{CardConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let telemetry = Arc::new(MemoryTelemetry::new());
//!     let collaborators = Collaborators::new(
//!         telemetry.clone(),
//!         Arc::new(RecordingSink::new()),
//!         Arc::new(MemoryTranslations::new()),
//!     );
//!
//!     let config = CardConfig::new("grill")?;
//!     let (mut card, inbox) = CardController::new(config, collaborators);
//!     let mut views = card.subscribe();
//!     let tx = card.sender();
//!
//!     tokio::spawn(async move {
//!         while let Ok(view) = views.recv().await {
//!             println!("{}: {}", view.status_label, view.probe_temp);
//!         }
//!     });
//!
//!     tx.send(CardEvent::Telemetry).ok();
//!     card.run(inbox).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization for data types and views

// Public modules
pub mod chart;
pub mod clock;
pub mod controller;
pub mod data;
pub mod error;
pub mod reconciler;
pub mod render;
pub mod source;
pub mod utils;

// Re-exports for convenience
pub use controller::{CardController, CardEvent, Collaborators, ElapsedTimer, UiEvent};
pub use error::{Error, Result};
pub use render::{CardView, StatusTracker};

// Re-export commonly used types from submodules
pub use chart::{ChartFrame, ChartWindow, SeriesSet};
pub use data::{
    CardConfig, CardEntity, ChartSpan, DeviceSnapshot, DeviceStatus, EntityIds, FoodReference,
    Sample,
};
pub use reconciler::{BackendSelection, BackendSync, SelectorSet};
pub use source::{Command, CommandSink, EntityState, TelemetrySource, TranslationProvider};
