//! Error types for collaborator device operations.
//!
//! Covers the failure modes of the fingerprint sensor, the camera pipeline
//! and the QR decoder: disconnection, timeouts, imaging and template errors,
//! encoder failures and buffer exhaustion.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or stopped answering.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Sensor could not take an image.
    #[error("Image capture error: {message}")]
    ImageCapture { message: String },

    /// Sensor could not turn an image into a feature set.
    #[error("Image conversion error: {message}")]
    ImageConversion { message: String },

    /// The two feature sets did not combine into a model.
    #[error("Model creation error: {message}")]
    ModelCreation { message: String },

    /// The model could not be written to the template store.
    #[error("Template storage error: {message}")]
    Storage { message: String },

    /// Frame encoding failed.
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// No buffer could be allocated for a frame.
    #[error("Resource exhausted: {message}")]
    ResourceExhausted { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new image capture error.
    pub fn image_capture(message: impl Into<String>) -> Self {
        Self::ImageCapture {
            message: message.into(),
        }
    }

    /// Create a new image conversion error.
    pub fn image_conversion(message: impl Into<String>) -> Self {
        Self::ImageConversion {
            message: message.into(),
        }
    }

    /// Create a new model creation error.
    pub fn model_creation(message: impl Into<String>) -> Self {
        Self::ModelCreation {
            message: message.into(),
        }
    }

    /// Create a new template storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a new resource exhaustion error.
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure only affects the current frame and the
    /// next cycle may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. } | Self::Timeout { .. })
    }
}

impl From<HardwareError> for kiosk_core::Error {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::ResourceExhausted { message } => Self::ResourceExhaustion(message),
            error if error.is_transient() => Self::SensorTransient(error.to_string()),
            error => Self::SensorFault(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("R503");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: R503");
    }

    #[test]
    fn test_enrollment_step_errors() {
        assert_eq!(
            HardwareError::image_conversion("slot 2").to_string(),
            "Image conversion error: slot 2"
        );
        assert_eq!(
            HardwareError::storage("flash full").to_string(),
            "Template storage error: flash full"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(HardwareError::resource_exhausted("jpeg buffer").is_transient());
        assert!(HardwareError::timeout(100).is_transient());
        assert!(!HardwareError::communication("uart framing").is_transient());
    }

    #[test]
    fn test_into_kiosk_error() {
        let error = kiosk_core::Error::from(HardwareError::timeout(100));
        assert!(matches!(error, kiosk_core::Error::SensorTransient(_)));
        assert!(error.is_transient());

        let error = kiosk_core::Error::from(HardwareError::resource_exhausted("jpeg buffer"));
        assert!(matches!(error, kiosk_core::Error::ResourceExhaustion(ref m) if m == "jpeg buffer"));

        let error = kiosk_core::Error::from(HardwareError::disconnected("R503"));
        assert!(matches!(error, kiosk_core::Error::SensorFault(_)));
        assert!(!error.is_transient());
    }
}
