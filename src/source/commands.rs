//! Command sink interface.
//!
//! Commands are fire-and-forget: the card never waits for the device state
//! to reflect them, the next telemetry push does that.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Lowest accepted target temperature in °C.
pub const MIN_TARGET_TEMP: f64 = 30.0;

/// Highest accepted target temperature in °C.
pub const MAX_TARGET_TEMP: f64 = 100.0;

/// A command addressed to the device.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Select a food preset.
    SetFood {
        /// Combined `"{category}_{food}"` identifier.
        food_type: String,
        /// Doneness identifier.
        doneness: String,
    },
    /// Set a manual target temperature.
    SetTargetTemp {
        /// Target in °C.
        celsius: f64,
    },
    /// Toggle carryover compensation.
    SetCarryover {
        /// New state.
        enabled: bool,
    },
    /// Start a cook.
    StartCooking,
    /// Stop the cook.
    StopCooking,
    /// Open the details dialog of an entity.
    ShowMoreInfo {
        /// Entity to show.
        entity_id: String,
    },
}

impl Command {
    /// Build a validated target-temperature command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] outside 30–100 °C.
    pub fn set_target_temp(celsius: f64) -> Result<Self> {
        if !(MIN_TARGET_TEMP..=MAX_TARGET_TEMP).contains(&celsius) {
            return Err(Error::InvalidParameter {
                name: "celsius".to_string(),
                value: celsius.to_string(),
            });
        }
        Ok(Self::SetTargetTemp { celsius })
    }

    /// The service name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFood { .. } => "set_food",
            Self::SetTargetTemp { .. } => "set_target_temp",
            Self::SetCarryover { .. } => "set_carryover",
            Self::StartCooking => "start_cooking",
            Self::StopCooking => "stop_cooking",
            Self::ShowMoreInfo { .. } => "more_info",
        }
    }

    /// Send this command through a sink.
    ///
    /// # Arguments
    ///
    /// * `sink` - The command receiver
    /// * `entity_id` - The device's state entity; more-info requests carry
    ///   their own target
    pub async fn dispatch(self, sink: &dyn CommandSink, entity_id: &str) -> Result<()> {
        match self {
            Self::SetFood {
                food_type,
                doneness,
            } => sink.set_food(entity_id, &food_type, &doneness).await,
            Self::SetTargetTemp { celsius } => sink.set_target_temp(entity_id, celsius).await,
            Self::SetCarryover { enabled } => sink.set_carryover(entity_id, enabled).await,
            Self::StartCooking => sink.start_cooking(entity_id).await,
            Self::StopCooking => sink.stop_cooking(entity_id).await,
            Self::ShowMoreInfo { entity_id } => sink.show_more_info(&entity_id).await,
        }
    }
}

/// Receiver of device commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Select a food preset.
    async fn set_food(&self, entity_id: &str, food_type: &str, doneness: &str) -> Result<()>;

    /// Set a manual target temperature in °C.
    async fn set_target_temp(&self, entity_id: &str, celsius: f64) -> Result<()>;

    /// Enable or disable carryover compensation.
    async fn set_carryover(&self, entity_id: &str, enabled: bool) -> Result<()>;

    /// Start a cook.
    async fn start_cooking(&self, entity_id: &str) -> Result<()>;

    /// Stop the cook.
    async fn stop_cooking(&self, entity_id: &str) -> Result<()>;

    /// Ask the host to show the details of an entity.
    async fn show_more_info(&self, entity_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_temp_bounds() {
        assert!(Command::set_target_temp(29.0).is_err());
        assert!(Command::set_target_temp(101.0).is_err());
        assert!(Command::set_target_temp(f64::NAN).is_err());
        assert_eq!(
            Command::set_target_temp(30.0).unwrap(),
            Command::SetTargetTemp { celsius: 30.0 }
        );
        assert_eq!(
            Command::set_target_temp(100.0).unwrap(),
            Command::SetTargetTemp { celsius: 100.0 }
        );
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_sink() {
        let mut sink = MockCommandSink::new();
        sink.expect_set_food()
            .withf(|id: &str, food: &str, doneness: &str| {
                id == "sensor.grill_state" && food == "beef_steak" && doneness == "medium"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        sink.expect_stop_cooking().times(1).returning(|_| Ok(()));

        Command::SetFood {
            food_type: "beef_steak".to_string(),
            doneness: "medium".to_string(),
        }
        .dispatch(&sink, "sensor.grill_state")
        .await
        .unwrap();
        Command::StopCooking
            .dispatch(&sink, "sensor.grill_state")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_more_info_targets_its_entity() {
        let mut sink = MockCommandSink::new();
        sink.expect_show_more_info()
            .withf(|id: &str| id == "sensor.grill_battery")
            .times(1)
            .returning(|_| Ok(()));

        Command::ShowMoreInfo {
            entity_id: "sensor.grill_battery".to_string(),
        }
        .dispatch(&sink, "sensor.grill_state")
        .await
        .unwrap();
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::StartCooking.name(), "start_cooking");
        assert_eq!(Command::SetCarryover { enabled: true }.name(), "set_carryover");
    }
}
