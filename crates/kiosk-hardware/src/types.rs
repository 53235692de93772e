//! Common types shared across device implementations.

use kiosk_core::UserId;
use serde::{Deserialize, Serialize};

/// Generic device information, logged once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "R503", "OV2640").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Result of one identification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A stored template matched the finger on the sensor.
    Matched(UserId),

    /// A finger was read but no stored template matched.
    NoMatch,

    /// Nothing on the sensor.
    NoFinger,
}

/// Result of a raw image poll during enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    FingerPresent,
    NoFinger,
}

/// Sensor character buffer receiving a converted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateSlot {
    First,
    Second,
}

impl TemplateSlot {
    /// Buffer number as used by the sensor command set.
    pub fn buffer_id(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }
}

/// An unencoded camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u16,
    pub height: u16,
    /// Monotonic counter assigned by the camera.
    pub sequence: u64,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_firmware() {
        let info = DeviceInfo::new("R503", "Capacitive fingerprint").with_firmware_version("1.2");
        assert_eq!(info.firmware_version.as_deref(), Some("1.2"));
    }

    #[test]
    fn test_template_slot_buffer_ids() {
        assert_eq!(TemplateSlot::First.buffer_id(), 1);
        assert_eq!(TemplateSlot::Second.buffer_id(), 2);
    }
}
