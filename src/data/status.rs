//! Device status as reported by the telemetry source.

/// The discrete cooking state of the device.
///
/// Exactly one value is active at a time, and it alone drives which
/// sections of the card are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceStatus {
    /// The probe is not reachable.
    #[default]
    Disconnected,
    /// The probe is connected and no cook is running.
    Idle,
    /// A cook is in progress.
    Cooking,
    /// The withdrawal temperature has been reached.
    Done,
}

impl DeviceStatus {
    /// Parse a status from the raw state string.
    ///
    /// Unknown states (e.g. `"unavailable"`) are treated as disconnected.
    pub fn from_raw(value: &str) -> Self {
        match value {
            "idle" => Self::Idle,
            "cooking" => Self::Cooking,
            "done" => Self::Done,
            _ => Self::Disconnected,
        }
    }

    /// The raw state string, also used as the translation key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Idle => "idle",
            Self::Cooking => "cooking",
            Self::Done => "done",
        }
    }

    /// Check if a cook is running.
    pub fn is_cooking(&self) -> bool {
        matches!(self, Self::Cooking)
    }

    /// Check if the cook is running or finished, i.e. a target is relevant.
    pub fn has_target(&self) -> bool {
        matches!(self, Self::Cooking | Self::Done)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_status_from_raw() {
        assert_eq!(DeviceStatus::from_raw("idle"), DeviceStatus::Idle);
        assert_eq!(DeviceStatus::from_raw("cooking"), DeviceStatus::Cooking);
        assert_eq!(DeviceStatus::from_raw("done"), DeviceStatus::Done);
        assert_eq!(
            DeviceStatus::from_raw("disconnected"),
            DeviceStatus::Disconnected
        );
        assert_eq!(
            DeviceStatus::from_raw("unavailable"),
            DeviceStatus::Disconnected
        );
    }

    #[test]
    fn test_device_status_methods() {
        assert!(DeviceStatus::Cooking.is_cooking());
        assert!(!DeviceStatus::Done.is_cooking());
        assert!(DeviceStatus::Done.has_target());
        assert!(!DeviceStatus::Idle.has_target());
        assert_eq!(DeviceStatus::Cooking.to_string(), "cooking");
    }
}
