//! Collaborator device trait definitions.
//!
//! These traits are the contract between the kiosk controller and the
//! devices it drives: the fingerprint sensor, the camera pipeline and the QR
//! decoder. Matching, imaging, JPEG encoding and QR decoding themselves live
//! behind these seams.
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT), so they
//! are not object-safe. Workers hold the enum wrappers from
//! [`devices`](crate::devices) instead of trait objects, which keeps the
//! futures concretely typed and therefore spawnable on the Tokio runtime.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use kiosk_core::EnrollmentId;

use crate::error::Result;
use crate::types::{DeviceInfo, ImageStatus, MatchOutcome, RawFrame, TemplateSlot};

/// Optical or capacitive fingerprint sensor with an on-board template store.
///
/// # Examples
///
/// ```no_run
/// use kiosk_hardware::traits::FingerprintSensor;
/// use kiosk_hardware::types::MatchOutcome;
/// use kiosk_hardware::error::Result;
///
/// async fn who_is_there<S: FingerprintSensor>(sensor: &mut S) -> Result<Option<u16>> {
///     match sensor.identify().await? {
///         MatchOutcome::Matched(user) => Ok(Some(user.as_u16())),
///         MatchOutcome::NoMatch | MatchOutcome::NoFinger => Ok(None),
///     }
/// }
/// ```
pub trait FingerprintSensor: Send + Sync {
    /// Handshake with the sensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor does not answer; the kiosk cannot
    /// start without it.
    async fn verify(&mut self) -> Result<()>;

    /// Take an image and search it against the template store.
    ///
    /// "No finger" and "no match" are outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error on a hard driver fault.
    async fn identify(&mut self) -> Result<MatchOutcome>;

    /// Take a raw image without searching.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::ImageCapture`](crate::HardwareError::ImageCapture)
    /// if the sensor reported an imaging failure.
    async fn capture_image(&mut self) -> Result<ImageStatus>;

    /// Convert the last image into a feature set stored in `slot`.
    async fn convert_image(&mut self, slot: TemplateSlot) -> Result<()>;

    /// Combine both feature sets into a model.
    async fn create_model(&mut self) -> Result<()>;

    /// Persist the model under `id`.
    async fn store_model(&mut self, id: EnrollmentId) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Camera with an attached JPEG encoder.
pub trait CameraDevice: Send + Sync {
    /// Grab the latest frame.
    ///
    /// Returns `Ok(None)` when no frame is ready yet.
    async fn capture_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Encode a frame as JPEG with the given quality (0-100).
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or no output buffer could be
    /// allocated.
    async fn encode_jpeg(&mut self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// QR code decoder attached to the camera stream.
pub trait QrDecoder: Send + Sync {
    /// Wait at most `timeout` for a decoded code.
    ///
    /// Returns `Ok(None)` when nothing was decoded in time.
    async fn try_decode(&mut self, timeout: Duration) -> Result<Option<String>>;
}
