//! Collaborator device abstraction layer for the kiosk controller.
//!
//! This crate provides trait-based abstractions for the devices the kiosk
//! drives: a fingerprint sensor with an on-board template store, a camera
//! with a JPEG encoder, and a QR decoder attached to the camera stream.
//! Mock implementations allow development and testing without hardware.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: Consumers hold [`devices::AnyFingerprintSensor`] and
//!   friends rather than trait objects.
//! - **Outcomes are not errors**: "no finger" and "no frame yet" are values,
//!   only driver faults are [`HardwareError`]s.
//!
//! # Fingerprint Sensors
//!
//! ```no_run
//! use kiosk_hardware::traits::FingerprintSensor;
//! use kiosk_hardware::types::{ImageStatus, TemplateSlot};
//! use kiosk_hardware::error::Result;
//!
//! async fn first_half<S: FingerprintSensor>(sensor: &mut S) -> Result<bool> {
//!     if sensor.capture_image().await? == ImageStatus::NoFinger {
//!         return Ok(false);
//!     }
//!     sensor.convert_image(TemplateSlot::First).await?;
//!     Ok(true)
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type. [`HardwareError::is_transient`] tells
//! callers which failures are worth retrying on the next poll.

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyCamera, AnyFingerprintSensor, AnyQrDecoder};
pub use error::{HardwareError, Result};
pub use traits::{CameraDevice, FingerprintSensor, QrDecoder};
pub use types::{DeviceInfo, ImageStatus, MatchOutcome, RawFrame, TemplateSlot};
