//! External collaborators of the card.
//!
//! The card reads device telemetry, sends commands, loads translation
//! tables and hands frames to a chart host. Each of these sits behind a
//! trait so the card can run against any backend.

pub mod chart;
pub mod commands;
pub mod memory;
pub mod telemetry;
pub mod translations;

pub use chart::{ChartBootstrap, ChartHost, RetryPolicy};
pub use commands::{Command, CommandSink, MAX_TARGET_TEMP, MIN_TARGET_TEMP};
pub use memory::{MemoryTelemetry, MemoryTranslations, RecordingSink};
pub use telemetry::{EntityState, TelemetrySource};
pub use translations::{StringTable, TranslationProvider, Translations};
