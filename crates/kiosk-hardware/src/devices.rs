//! Enum wrappers for collaborator device dispatch.
//!
//! Native `async fn` in traits are not object-safe, so `Box<dyn
//! FingerprintSensor>` is not an option. The workers hold these enums
//! instead, which keeps every future concretely typed and spawnable.
//!
//! # Examples
//!
//! ```
//! use kiosk_hardware::devices::AnyFingerprintSensor;
//! use kiosk_hardware::mock::MockFingerprintSensor;
//!
//! let (sensor, _handle) = MockFingerprintSensor::new();
//! let any_sensor = AnyFingerprintSensor::Mock(sensor);
//!
//! // Can now be used polymorphically through the FingerprintSensor trait
//! ```

use std::time::Duration;

use kiosk_core::EnrollmentId;

use crate::mock::{MockCamera, MockFingerprintSensor, MockQrDecoder};
use crate::traits::{CameraDevice, FingerprintSensor, QrDecoder};
use crate::types::{DeviceInfo, ImageStatus, MatchOutcome, RawFrame, TemplateSlot};
use crate::Result;

/// Enum wrapper for fingerprint sensor dispatch.
///
/// # Examples
///
/// ```
/// use kiosk_hardware::devices::AnyFingerprintSensor;
/// use kiosk_hardware::traits::FingerprintSensor;
/// use kiosk_hardware::mock::MockFingerprintSensor;
///
/// #[tokio::main]
/// async fn main() -> kiosk_hardware::Result<()> {
///     let (sensor, _handle) = MockFingerprintSensor::new();
///     let mut any_sensor = AnyFingerprintSensor::Mock(sensor);
///
///     any_sensor.verify().await?;
///     let info = any_sensor.get_info().await?;
///     println!("Sensor: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFingerprintSensor {
    /// Mock sensor for development and testing.
    Mock(MockFingerprintSensor),
}

impl FingerprintSensor for AnyFingerprintSensor {
    async fn verify(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.verify().await,
        }
    }

    async fn identify(&mut self) -> Result<MatchOutcome> {
        match self {
            Self::Mock(device) => device.identify().await,
        }
    }

    async fn capture_image(&mut self) -> Result<ImageStatus> {
        match self {
            Self::Mock(device) => device.capture_image().await,
        }
    }

    async fn convert_image(&mut self, slot: TemplateSlot) -> Result<()> {
        match self {
            Self::Mock(device) => device.convert_image(slot).await,
        }
    }

    async fn create_model(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.create_model().await,
        }
    }

    async fn store_model(&mut self, id: EnrollmentId) -> Result<()> {
        match self {
            Self::Mock(device) => device.store_model(id).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCamera {
    /// Mock camera for development and testing.
    Mock(MockCamera),
}

impl CameraDevice for AnyCamera {
    async fn capture_frame(&mut self) -> Result<Option<RawFrame>> {
        match self {
            Self::Mock(device) => device.capture_frame().await,
        }
    }

    async fn encode_jpeg(&mut self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>> {
        match self {
            Self::Mock(device) => device.encode_jpeg(frame, quality).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for QR decoder dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyQrDecoder {
    /// Mock decoder for development and testing.
    Mock(MockQrDecoder),
}

impl QrDecoder for AnyQrDecoder {
    async fn try_decode(&mut self, timeout: Duration) -> Result<Option<String>> {
        match self {
            Self::Mock(device) => device.try_decode(timeout).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::UserId;

    #[tokio::test]
    async fn test_sensor_dispatch() {
        let (sensor, handle) = MockFingerprintSensor::new();
        let mut any_sensor = AnyFingerprintSensor::Mock(sensor);

        handle.queue_match(UserId::new(12));
        assert_eq!(
            any_sensor.identify().await.unwrap(),
            MatchOutcome::Matched(UserId::new(12))
        );
    }

    #[tokio::test]
    async fn test_camera_dispatch() {
        let (camera, _handle) = MockCamera::new();
        let mut any_camera = AnyCamera::Mock(camera);

        let frame = any_camera.capture_frame().await.unwrap().unwrap();
        let jpeg = any_camera.encode_jpeg(&frame, 60).await.unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn test_decoder_dispatch() {
        let (decoder, handle) = MockQrDecoder::new();
        let mut any_decoder = AnyQrDecoder::Mock(decoder);

        handle.show("1;7-Desk");
        let code = any_decoder.try_decode(Duration::from_millis(50)).await.unwrap();
        assert_eq!(code.as_deref(), Some("1;7-Desk"));
    }
}
