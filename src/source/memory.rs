//! In-memory collaborators.
//!
//! [`MemoryTelemetry`], [`RecordingSink`] and [`MemoryTranslations`]
//! implement the source traits without any backend so the card can be
//! driven from demos and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::data::history::{sort_samples, Sample};
use crate::error::{Error, Result};
use crate::source::commands::{Command, CommandSink};
use crate::source::telemetry::{EntityState, TelemetrySource};
use crate::source::translations::{StringTable, TranslationProvider};

/// Telemetry source backed by maps.
///
/// # Example
///
/// ```
/// use cooker_card::source::memory::MemoryTelemetry;
/// use cooker_card::source::telemetry::{EntityState, TelemetrySource};
///
/// let telemetry = MemoryTelemetry::new();
/// telemetry.set_state(EntityState::new("sensor.grill_state", "idle"));
/// assert_eq!(
///     telemetry.current_state("sensor.grill_state").map(|s| s.state),
///     Some("idle".to_string())
/// );
/// ```
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    language: RwLock<Option<String>>,
    states: RwLock<HashMap<String, EntityState>>,
    history: RwLock<HashMap<String, Vec<Sample>>>,
    history_latency: RwLock<Duration>,
    fail_history: AtomicBool,
}

impl MemoryTelemetry {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported language.
    pub fn set_language(&self, language: Option<&str>) {
        *self.language.write() = language.map(str::to_string);
    }

    /// Insert or replace an entity state.
    pub fn set_state(&self, state: EntityState) {
        self.states.write().insert(state.entity_id.clone(), state);
    }

    /// Remove an entity.
    pub fn remove_state(&self, entity_id: &str) {
        self.states.write().remove(entity_id);
    }

    /// Append a sample to an entity's history.
    pub fn push_sample(&self, entity_id: &str, sample: Sample) {
        let mut history = self.history.write();
        let samples = history.entry(entity_id.to_string()).or_default();
        samples.push(sample);
        sort_samples(samples);
    }

    /// Delay every history query.
    pub fn set_history_latency(&self, latency: Duration) {
        *self.history_latency.write() = latency;
    }

    /// Make history queries fail (they return no samples).
    pub fn set_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TelemetrySource for MemoryTelemetry {
    fn language(&self) -> Option<String> {
        self.language.read().clone()
    }

    fn current_state(&self, entity_id: &str) -> Option<EntityState> {
        self.states.read().get(entity_id).cloned()
    }

    async fn history(&self, entity_id: &str, hours_back: u32) -> Vec<Sample> {
        let latency = *self.history_latency.read();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_history.load(Ordering::SeqCst) {
            return Vec::new();
        }

        let samples = self
            .history
            .read()
            .get(entity_id)
            .cloned()
            .unwrap_or_default();
        let cutoff = samples
            .last()
            .map(|s| s.timestamp - chrono::Duration::hours(i64::from(hours_back)));

        match cutoff {
            Some(cutoff) => samples
                .into_iter()
                .filter(|s| s.timestamp >= cutoff)
                .collect(),
            None => samples,
        }
    }
}

/// Command sink that records every command it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: RwLock<Vec<(String, Command)>>,
    fail: AtomicBool,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, with their target entity.
    pub fn commands(&self) -> Vec<(String, Command)> {
        self.commands.read().clone()
    }

    /// Make every command fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, entity_id: &str, command: Command) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::CommandFailed {
                command: command.name().to_string(),
                reason: "sink unavailable".to_string(),
            });
        }
        self.commands.write().push((entity_id.to_string(), command));
        Ok(())
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn set_food(&self, entity_id: &str, food_type: &str, doneness: &str) -> Result<()> {
        self.record(
            entity_id,
            Command::SetFood {
                food_type: food_type.to_string(),
                doneness: doneness.to_string(),
            },
        )
    }

    async fn set_target_temp(&self, entity_id: &str, celsius: f64) -> Result<()> {
        self.record(entity_id, Command::SetTargetTemp { celsius })
    }

    async fn set_carryover(&self, entity_id: &str, enabled: bool) -> Result<()> {
        self.record(entity_id, Command::SetCarryover { enabled })
    }

    async fn start_cooking(&self, entity_id: &str) -> Result<()> {
        self.record(entity_id, Command::StartCooking)
    }

    async fn stop_cooking(&self, entity_id: &str) -> Result<()> {
        self.record(entity_id, Command::StopCooking)
    }

    async fn show_more_info(&self, entity_id: &str) -> Result<()> {
        self.record(
            entity_id,
            Command::ShowMoreInfo {
                entity_id: entity_id.to_string(),
            },
        )
    }
}

/// Translation provider serving tables from memory.
#[derive(Debug, Default)]
pub struct MemoryTranslations {
    tables: RwLock<HashMap<String, StringTable>>,
}

impl MemoryTranslations {
    /// Create a provider without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table.
    pub fn with_table(self, code: &str, entries: &[(&str, &str)]) -> Self {
        let table = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.tables.write().insert(code.to_string(), table);
        self
    }
}

#[async_trait]
impl TranslationProvider for MemoryTranslations {
    async fn load_language(&self, code: &str) -> Result<StringTable> {
        self.tables
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| Error::TranslationLoad {
                language: code.to_string(),
                reason: "no such table".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_history_window() {
        let telemetry = MemoryTelemetry::new();
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        for h in 0..5 {
            telemetry.push_sample(
                "sensor.x_probe_temperature",
                Sample::new(t + chrono::Duration::hours(h), h as f64),
            );
        }

        let samples = telemetry.history("sensor.x_probe_temperature", 2).await;
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].value, 2.0);

        telemetry.set_fail_history(true);
        assert!(telemetry.history("sensor.x_probe_temperature", 2).await.is_empty());
        assert!(telemetry.history("sensor.unknown", 2).await.is_empty());
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.start_cooking("sensor.x_state").await.unwrap();
        sink.set_fail(true);
        assert!(sink.stop_cooking("sensor.x_state").await.is_err());
        assert_eq!(
            sink.commands(),
            vec![("sensor.x_state".to_string(), Command::StartCooking)]
        );
    }

    #[tokio::test]
    async fn test_memory_translations() {
        let provider = MemoryTranslations::new().with_table("fr", &[("idle", "Inactif")]);
        assert_eq!(provider.load_language("fr").await.unwrap()["idle"], "Inactif");
        assert!(provider.load_language("de").await.is_err());
    }
}
