//! Telemetry source interface.
//!
//! The telemetry source exposes the current state of each device entity
//! and a queryable history of timestamped samples.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::data::history::Sample;
use crate::utils::parse_numeric;

/// Raw state of one telemetry entity.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityState {
    /// Entity identifier, e.g. `"sensor.grill_state"`.
    pub entity_id: String,
    /// Raw state string.
    pub state: String,
    /// Loosely-typed attributes.
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Create an entity state without attributes.
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Get an attribute, treating JSON `null` as absent.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// The state string parsed as a number.
    pub fn numeric_state(&self) -> Option<f64> {
        parse_numeric(&Value::String(self.state.clone()))
    }
}

/// Source of device telemetry.
///
/// Implementations must never fail across this boundary: an absent entity
/// is `None` and a failed history query is an empty vector.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// The user's language (e.g. `"fr-FR"`), if known.
    fn language(&self) -> Option<String>;

    /// The current state of an entity.
    fn current_state(&self, entity_id: &str) -> Option<EntityState>;

    /// Samples of a numeric entity over the last `hours_back` hours,
    /// ordered by time.
    async fn history(&self, entity_id: &str, hours_back: u32) -> Vec<Sample>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_state_attributes() {
        let state = EntityState::new("sensor.grill_state", "cooking")
            .with_attribute("withdrawal_temp", 57.0)
            .with_attribute("food_doneness", Value::Null);

        assert_eq!(state.attribute("withdrawal_temp"), Some(&json!(57.0)));
        assert!(state.attribute("food_doneness").is_none());
        assert!(state.attribute("missing").is_none());
    }

    #[test]
    fn test_entity_numeric_state() {
        assert_eq!(EntityState::new("a", "21.5").numeric_state(), Some(21.5));
        assert_eq!(EntityState::new("a", "unknown").numeric_state(), None);
    }
}
