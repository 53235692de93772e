//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be scripted
//! programmatically without requiring physical hardware.

pub mod camera;
pub mod decoder;
pub mod fingerprint;

// Re-export commonly used types
pub use camera::{MockCamera, MockCameraHandle};
pub use decoder::{MockQrDecoder, MockQrHandle};
pub use fingerprint::{MockFingerprintHandle, MockFingerprintSensor, MockStep};
