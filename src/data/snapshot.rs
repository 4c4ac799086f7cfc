//! Device snapshot parsed from the telemetry source.

use serde_json::Value;

use crate::data::config::EntityIds;
use crate::data::food::food_from_type;
use crate::data::history::{last_value, parse_attribute_history, Sample, Timestamp};
use crate::data::status::DeviceStatus;
use crate::source::telemetry::{EntityState, TelemetrySource};
use crate::utils::{parse_bool, parse_numeric, parse_text, parse_timestamp};

/// Everything the card knows about the device at one instant.
///
/// Replaced wholesale on every telemetry push and never partially mutated.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceSnapshot {
    /// Discrete device state.
    pub status: DeviceStatus,
    /// Core temperature in °C.
    pub probe_temp: Option<f64>,
    /// Ambient temperature in °C.
    pub ambient_temp: Option<f64>,
    /// Target temperature reported by the target sensor.
    pub target_temp: Option<f64>,
    /// Temperature at which the food should be pulled.
    pub withdrawal_temp: Option<f64>,
    /// Final temperature the user wants after carryover.
    pub desired_temp: Option<f64>,
    /// Last manual target, remembered while a preset is selected.
    pub manual_temp_memory: Option<f64>,
    /// Selected food category.
    pub food_category: Option<String>,
    /// Selected combined food type, e.g. `"beef_steak"`.
    pub food_type: Option<String>,
    /// Selected doneness.
    pub doneness: Option<String>,
    /// Whether a manual target is in use instead of a preset.
    pub is_manual_mode: bool,
    /// Whether carryover compensation is enabled.
    pub carryover_enabled: bool,
    /// Battery level in percent.
    pub battery: Option<f64>,
    /// Signal strength in dBm.
    pub rssi: Option<f64>,
    /// Whether the probe itself is reachable.
    pub probe_connected: bool,
    /// When the current cook started.
    pub start_time: Option<Timestamp>,
    /// Predicted end of the current cook.
    pub estimated_end: Option<Timestamp>,
    /// Predicted minutes until the withdrawal temperature.
    pub remaining_minutes: Option<f64>,
    /// Cook progress in percent.
    pub progress: Option<f64>,
    /// Heating rate in °C/min.
    pub heating_rate: Option<f64>,
    /// Seconds since the probe was last seen.
    pub disconnect_seconds: Option<f64>,
    /// Recent probe readings carried in the state attributes.
    pub probe_history: Vec<Sample>,
    /// Recent ambient readings carried in the state attributes.
    pub ambient_history: Vec<Sample>,
}

impl DeviceSnapshot {
    /// Read a snapshot from the telemetry source.
    ///
    /// Returns `None` when the state entity is absent. Every other missing
    /// or non-numeric value simply becomes `None`.
    ///
    /// # Arguments
    ///
    /// * `source` - The telemetry source
    /// * `ids` - Entity identifiers derived from the card configuration
    pub fn read(source: &dyn TelemetrySource, ids: &EntityIds) -> Option<Self> {
        let state = source.current_state(&ids.state)?;

        let sensor = |entity: &str, attribute: &str| -> Option<f64> {
            source
                .current_state(entity)
                .and_then(|s| s.numeric_state())
                .or_else(|| state.attribute(attribute).and_then(parse_numeric))
        };
        let instant = |entity: &str, attribute: &str| -> Option<Timestamp> {
            source
                .current_state(entity)
                .and_then(|s| parse_timestamp(&Value::String(s.state)))
                .or_else(|| state.attribute(attribute).and_then(parse_timestamp))
        };

        let mut snapshot = Self::from_state(&state);
        snapshot.remaining_minutes = sensor(&ids.remaining_time, "remaining_time");
        snapshot.progress = sensor(&ids.progress, "progress");
        snapshot.heating_rate = sensor(&ids.heating_rate, "heating_rate");
        snapshot.start_time = instant(&ids.start_time, "start_time");
        snapshot.estimated_end = instant(&ids.estimated_end, "estimated_end_time");
        snapshot.target_temp = sensor(&ids.target_temp, "target_temp");
        snapshot.probe_temp = source
            .current_state(&ids.probe_temp)
            .and_then(|s| s.numeric_state())
            .or_else(|| last_value(&snapshot.probe_history));
        snapshot.ambient_temp = source
            .current_state(&ids.ambient_temp)
            .and_then(|s| s.numeric_state())
            .or_else(|| last_value(&snapshot.ambient_history));
        if snapshot.battery.is_none() {
            snapshot.battery = source
                .current_state(&ids.battery)
                .and_then(|s| s.numeric_state());
        }
        if snapshot.rssi.is_none() {
            snapshot.rssi = source.current_state(&ids.rssi).and_then(|s| s.numeric_state());
        }

        Some(snapshot)
    }

    /// Parse the fields carried by the state entity alone.
    pub fn from_state(state: &EntityState) -> Self {
        let number = |key: &str| state.attribute(key).and_then(parse_numeric);
        let flag = |key: &str| state.attribute(key).and_then(parse_bool).unwrap_or(false);
        let text = |key: &str| state.attribute(key).and_then(parse_text);
        let instant = |key: &str| state.attribute(key).and_then(parse_timestamp);
        let history = |key: &str| {
            state
                .attribute(key)
                .map(parse_attribute_history)
                .unwrap_or_default()
        };

        let probe_history = history("temp_history");
        let ambient_history = history("ambient_history");

        Self {
            status: DeviceStatus::from_raw(&state.state),
            probe_temp: last_value(&probe_history),
            ambient_temp: last_value(&ambient_history),
            target_temp: number("target_temp"),
            withdrawal_temp: number("withdrawal_temp"),
            desired_temp: number("desired_temp"),
            manual_temp_memory: number("manual_temp_memory"),
            food_category: text("food_category"),
            food_type: text("food_type"),
            doneness: text("food_doneness"),
            is_manual_mode: flag("is_manual_mode"),
            carryover_enabled: flag("carryover_enabled"),
            battery: number("battery"),
            rssi: number("rssi"),
            probe_connected: flag("probe_connected"),
            start_time: instant("start_time"),
            estimated_end: instant("estimated_end_time"),
            remaining_minutes: number("remaining_time"),
            progress: number("progress"),
            heating_rate: number("heating_rate"),
            disconnect_seconds: number("disconnect_duration"),
            probe_history,
            ambient_history,
        }
    }

    /// The food id within its category, e.g. `"steak"` for `"beef_steak"`.
    pub fn food(&self) -> Option<&str> {
        self.food_type.as_deref().map(food_from_type)
    }

    /// The target shown on the card: the withdrawal temperature when
    /// carryover compensation is on, otherwise the desired temperature.
    pub fn displayed_target(&self) -> Option<f64> {
        self.withdrawal_temp
            .filter(|_| self.carryover_enabled)
            .or(self.desired_temp)
    }

    /// The value shown in the settings target field.
    pub fn settings_target(&self) -> Option<f64> {
        if self.is_manual_mode {
            self.manual_temp_memory
        } else {
            self.desired_temp
        }
    }

    /// Disconnection time in whole minutes.
    pub fn disconnect_minutes(&self) -> Option<u64> {
        self.disconnect_seconds
            .filter(|s| *s >= 0.0)
            .map(|s| (s / 60.0).floor() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::telemetry::MockTelemetrySource;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn cooking_state() -> EntityState {
        EntityState::new("sensor.grill_state", "cooking")
            .with_attribute("food_category", "beef")
            .with_attribute("food_type", "beef_steak")
            .with_attribute("food_doneness", "medium")
            .with_attribute("withdrawal_temp", 57.0)
            .with_attribute("desired_temp", 60.0)
            .with_attribute("carryover_enabled", true)
            .with_attribute("is_manual_mode", false)
            .with_attribute("probe_connected", true)
            .with_attribute("battery", 80)
            .with_attribute("rssi", "-65")
            .with_attribute("disconnect_duration", 125)
            .with_attribute(
                "temp_history",
                json!([
                    ["2026-01-20T16:39:29+00:00", 18.5],
                    ["2026-01-20T16:40:29+00:00", 19.0]
                ]),
            )
    }

    #[test]
    fn test_from_state() {
        let snapshot = DeviceSnapshot::from_state(&cooking_state());

        assert_eq!(snapshot.status, DeviceStatus::Cooking);
        assert_eq!(snapshot.food_category.as_deref(), Some("beef"));
        assert_eq!(snapshot.food(), Some("steak"));
        assert_eq!(snapshot.doneness.as_deref(), Some("medium"));
        assert_eq!(snapshot.displayed_target(), Some(57.0));
        assert_eq!(snapshot.battery, Some(80.0));
        assert_eq!(snapshot.rssi, Some(-65.0));
        assert_eq!(snapshot.probe_temp, Some(19.0));
        assert_eq!(snapshot.probe_history.len(), 2);
        assert_eq!(snapshot.disconnect_minutes(), Some(2));
        assert!(snapshot.ambient_history.is_empty());
        assert_eq!(snapshot.ambient_temp, None);
    }

    #[test]
    fn test_displayed_target_without_carryover() {
        let mut snapshot = DeviceSnapshot::from_state(&cooking_state());
        snapshot.carryover_enabled = false;
        assert_eq!(snapshot.displayed_target(), Some(60.0));

        snapshot.carryover_enabled = true;
        snapshot.withdrawal_temp = None;
        assert_eq!(snapshot.displayed_target(), Some(60.0));
    }

    #[test]
    fn test_settings_target() {
        let mut snapshot = DeviceSnapshot::from_state(&cooking_state());
        snapshot.manual_temp_memory = Some(82.0);
        assert_eq!(snapshot.settings_target(), Some(60.0));
        snapshot.is_manual_mode = true;
        assert_eq!(snapshot.settings_target(), Some(82.0));
    }

    #[test]
    fn test_unknown_state_and_garbage_attributes() {
        let state = EntityState::new("sensor.grill_state", "unavailable")
            .with_attribute("battery", "low")
            .with_attribute("food_category", "");
        let snapshot = DeviceSnapshot::from_state(&state);
        assert_eq!(snapshot.status, DeviceStatus::Disconnected);
        assert_eq!(snapshot.battery, None);
        assert_eq!(snapshot.food_category, None);
        assert!(!snapshot.probe_connected);
    }

    #[test]
    fn test_read_prefers_sensor_entities() {
        let ids = EntityIds::from_prefix("grill");
        let mut source = MockTelemetrySource::new();
        source.expect_current_state().returning(|id| match id {
            "sensor.grill_state" => Some(cooking_state()),
            "sensor.grill_probe_temperature" => Some(EntityState::new(id, "42.25")),
            "sensor.grill_remaining_time" => Some(EntityState::new(id, "20")),
            "sensor.grill_start_time" => {
                Some(EntityState::new(id, "2026-01-20T16:30:00+00:00"))
            }
            "sensor.grill_heating_rate" => Some(EntityState::new(id, "unknown")),
            _ => None,
        });

        let snapshot = DeviceSnapshot::read(&source, &ids).unwrap();
        assert_eq!(snapshot.probe_temp, Some(42.25));
        assert_eq!(snapshot.remaining_minutes, Some(20.0));
        assert_eq!(snapshot.heating_rate, None);
        assert_eq!(
            snapshot.start_time,
            Some(Utc.with_ymd_and_hms(2026, 1, 20, 16, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_read_absent_state() {
        let mut source = MockTelemetrySource::new();
        source.expect_current_state().returning(|_| None);
        assert!(DeviceSnapshot::read(&source, &EntityIds::from_prefix("x")).is_none());
    }
}
