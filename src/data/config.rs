//! Card configuration and the telemetry identifiers derived from it.

use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::utils::parse_bool;

/// Card configuration.
///
/// Supplied once at setup and immutable afterwards; reconfiguring replaces
/// it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardConfig {
    /// Prefix all telemetry entity ids are derived from.
    pub entity_prefix: String,
    /// Show the battery indicator.
    pub show_battery: bool,
    /// Show the signal strength indicator.
    pub show_rssi: bool,
    /// Show the temperature chart.
    pub show_graph: bool,
    /// Show the ambient temperature block.
    pub show_ambient: bool,
    /// Show the heating rate readout.
    pub show_rate: bool,
    /// Offset used to format wall-clock times, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl CardConfig {
    /// Create a configuration with all display flags enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `entity_prefix` is empty.
    pub fn new(entity_prefix: impl Into<String>) -> Result<Self> {
        let entity_prefix = entity_prefix.into();
        if entity_prefix.trim().is_empty() {
            return Err(Error::Configuration {
                field: "entity_prefix".to_string(),
            });
        }

        Ok(Self {
            entity_prefix,
            show_battery: true,
            show_rssi: true,
            show_graph: true,
            show_ambient: true,
            show_rate: true,
            utc_offset_minutes: 0,
        })
    }

    /// Parse a configuration from a raw key/value object.
    ///
    /// Boolean flags default to `true` when absent or not boolean.
    ///
    /// # Example
    ///
    /// ```
    /// use cooker_card::CardConfig;
    /// use serde_json::json;
    ///
    /// let config = CardConfig::from_value(&json!({
    ///     "entity_prefix": "grill",
    ///     "show_rssi": false
    /// })).unwrap();
    /// assert!(config.show_battery);
    /// assert!(!config.show_rssi);
    ///
    /// assert!(CardConfig::from_value(&json!({})).is_err());
    /// ```
    pub fn from_value(raw: &Value) -> Result<Self> {
        let prefix = raw
            .get("entity_prefix")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut config = Self::new(prefix)?;

        let flag = |key: &str| raw.get(key).and_then(parse_bool).unwrap_or(true);
        config.show_battery = flag("show_battery");
        config.show_rssi = flag("show_rssi");
        config.show_graph = flag("show_graph");
        config.show_ambient = flag("show_ambient");
        config.show_rate = flag("show_rate");
        config.utc_offset_minutes = raw
            .get("utc_offset_minutes")
            .and_then(Value::as_i64)
            .map(|m| m.clamp(-14 * 60, 14 * 60) as i32)
            .unwrap_or(0);

        Ok(config)
    }

    /// Set the battery indicator flag.
    pub fn with_battery(mut self, show: bool) -> Self {
        self.show_battery = show;
        self
    }

    /// Set the signal indicator flag.
    pub fn with_rssi(mut self, show: bool) -> Self {
        self.show_rssi = show;
        self
    }

    /// Set the chart flag.
    pub fn with_graph(mut self, show: bool) -> Self {
        self.show_graph = show;
        self
    }

    /// Set the wall-clock offset.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// The wall-clock offset as a chrono offset.
    pub fn time_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Derive the telemetry entity identifiers.
    pub fn entities(&self) -> EntityIds {
        EntityIds::from_prefix(&self.entity_prefix)
    }
}

/// Telemetry entity identifiers for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityIds {
    /// Status entity; also the command target.
    pub state: String,
    /// Probe (core) temperature.
    pub probe_temp: String,
    /// Withdrawal/target temperature.
    pub target_temp: String,
    /// Cook progress in percent.
    pub progress: String,
    /// Ambient temperature.
    pub ambient_temp: String,
    /// Predicted remaining minutes.
    pub remaining_time: String,
    /// Heating rate in °C/min.
    pub heating_rate: String,
    /// Cook start time.
    pub start_time: String,
    /// Predicted end time.
    pub estimated_end: String,
    /// Battery level.
    pub battery: String,
    /// Signal strength.
    pub rssi: String,
}

/// A clickable reading of the card, identifying the entity behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardEntity {
    /// Status badge.
    State,
    /// Core temperature.
    ProbeTemp,
    /// Target temperature row.
    TargetTemp,
    /// Progress ring.
    Progress,
    /// Ambient reading.
    AmbientTemp,
    /// Remaining time block.
    RemainingTime,
    /// Heating rate readout.
    HeatingRate,
    /// Start time block.
    StartTime,
    /// End time block.
    EstimatedEnd,
    /// Battery indicator.
    Battery,
    /// Signal indicator.
    Rssi,
}

impl EntityIds {
    /// The identifier behind a card reading.
    pub fn id(&self, entity: CardEntity) -> &str {
        match entity {
            CardEntity::State => &self.state,
            CardEntity::ProbeTemp => &self.probe_temp,
            CardEntity::TargetTemp => &self.target_temp,
            CardEntity::Progress => &self.progress,
            CardEntity::AmbientTemp => &self.ambient_temp,
            CardEntity::RemainingTime => &self.remaining_time,
            CardEntity::HeatingRate => &self.heating_rate,
            CardEntity::StartTime => &self.start_time,
            CardEntity::EstimatedEnd => &self.estimated_end,
            CardEntity::Battery => &self.battery,
            CardEntity::Rssi => &self.rssi,
        }
    }

    /// Derive every identifier from a prefix.
    pub fn from_prefix(prefix: &str) -> Self {
        let id = |suffix: &str| format!("sensor.{}_{}", prefix, suffix);
        Self {
            state: id("state"),
            probe_temp: id("probe_temperature"),
            target_temp: id("target_temperature"),
            progress: id("progress"),
            ambient_temp: id("ambient_temperature"),
            remaining_time: id("remaining_time"),
            heating_rate: id("heating_rate"),
            start_time: id("start_time"),
            estimated_end: id("estimated_end_time"),
            battery: id("battery"),
            rssi: id("signal_strength"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_config_requires_prefix() {
        let err = CardConfig::new("").unwrap_err();
        assert!(err.is_fatal());
        assert!(CardConfig::new("   ").is_err());
        assert!(CardConfig::from_value(&json!({ "entity_prefix": "" })).is_err());
        assert!(CardConfig::from_value(&json!({ "show_graph": true })).is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = CardConfig::from_value(&json!({ "entity_prefix": "bbq" })).unwrap();
        assert_eq!(config, CardConfig::new("bbq").unwrap());
        assert!(config.show_battery && config.show_rssi && config.show_graph);
    }

    #[test]
    fn test_config_flags() {
        let config = CardConfig::from_value(&json!({
            "entity_prefix": "bbq",
            "show_battery": false,
            "show_graph": "off",
            "utc_offset_minutes": 120
        }))
        .unwrap();
        assert!(!config.show_battery);
        assert!(!config.show_graph);
        assert!(config.show_rssi);
        assert_eq!(config.time_offset(), FixedOffset::east_opt(7200).unwrap());
    }

    #[test]
    fn test_entity_ids() {
        let ids = EntityIds::from_prefix("oven");
        assert_eq!(ids.state, "sensor.oven_state");
        assert_eq!(ids.probe_temp, "sensor.oven_probe_temperature");
        assert_eq!(ids.ambient_temp, "sensor.oven_ambient_temperature");
        assert_eq!(ids.estimated_end, "sensor.oven_estimated_end_time");
        assert_eq!(ids.rssi, "sensor.oven_signal_strength");
        assert_eq!(ids.id(CardEntity::Battery), "sensor.oven_battery");
        assert_eq!(ids.id(CardEntity::TargetTemp), "sensor.oven_target_temperature");
        assert_eq!(ids.id(CardEntity::State), ids.state);
    }
}
