//! Controller timing and tuning parameters.

use std::time::Duration;

use kiosk_core::constants::{
    DEFAULT_BIOMETRIC_POLL_MS, DEFAULT_CODE_INTERVAL_MS, DEFAULT_DECODE_TIMEOUT_MS,
    DEFAULT_ENROLL_TIMEOUT_MS, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_FRAME_PUT_TIMEOUT_MS,
    DEFAULT_JPEG_QUALITY, DEFAULT_SUCCESS_HOLD_MS, ENROLL_IMAGE_POLL_MS,
};

use crate::notifier::DEFAULT_PUSH_CAPACITY;

/// Worker timings and buffer sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub biometric_poll_interval: Duration,
    pub frame_interval: Duration,
    pub code_interval: Duration,
    pub decode_timeout: Duration,
    pub frame_put_timeout: Duration,
    /// How long `Success` is held, measured from the transition.
    pub success_hold: Duration,
    /// Upper bound for one enrollment job.
    pub enroll_timeout: Duration,
    pub enroll_image_poll: Duration,
    pub jpeg_quality: u8,
    pub push_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            biometric_poll_interval: Duration::from_millis(DEFAULT_BIOMETRIC_POLL_MS),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            code_interval: Duration::from_millis(DEFAULT_CODE_INTERVAL_MS),
            decode_timeout: Duration::from_millis(DEFAULT_DECODE_TIMEOUT_MS),
            frame_put_timeout: Duration::from_millis(DEFAULT_FRAME_PUT_TIMEOUT_MS),
            success_hold: Duration::from_millis(DEFAULT_SUCCESS_HOLD_MS),
            enroll_timeout: Duration::from_millis(DEFAULT_ENROLL_TIMEOUT_MS),
            enroll_image_poll: Duration::from_millis(ENROLL_IMAGE_POLL_MS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            push_capacity: DEFAULT_PUSH_CAPACITY,
        }
    }
}
