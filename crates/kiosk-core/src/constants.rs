//! Core constants for the kiosk access controller.
//!
//! This module centralizes the wire-format delimiters, enrollment id range,
//! default timings and the user-facing status payloads shared by every crate
//! in the workspace.
//!
//! # Usage
//!
//! ```
//! use kiosk_core::constants::*;
//!
//! fn is_valid_slot(id: u8) -> bool {
//!     (MIN_ENROLLMENT_ID..=MAX_ENROLLMENT_ID).contains(&id)
//! }
//!
//! assert!(is_valid_slot(5));
//! assert!(!is_valid_slot(0));
//! ```

// ============================================================================
// QR Payload Format
// ============================================================================

/// Field separator of a QR ticket payload.
///
/// # Examples
///
/// ```
/// use kiosk_core::constants::QR_FIELD_DELIMITER;
///
/// let fields: Vec<&str> = "1;42-LaptopA".split(QR_FIELD_DELIMITER).collect();
/// assert_eq!(fields, vec!["1", "42-LaptopA"]);
/// ```
pub const QR_FIELD_DELIMITER: char = ';';

/// Separator between the laptop id and its name inside the ticket field.
pub const QR_ID_DELIMITER: char = '-';

/// Zero-based index of the ticket field (`<id>-<name>`) in a QR payload.
pub const QR_TICKET_FIELD_INDEX: usize = 1;

// ============================================================================
// Enrollment
// ============================================================================

/// Lowest template slot accepted for enrollment.
pub const MIN_ENROLLMENT_ID: u8 = 1;

/// Highest template slot accepted for enrollment.
///
/// The sensor library stores at most 127 templates.
pub const MAX_ENROLLMENT_ID: u8 = 127;

// ============================================================================
// Default Timings (milliseconds)
// ============================================================================

/// Interval between two fingerprint identification attempts.
pub const DEFAULT_BIOMETRIC_POLL_MS: u64 = 200;

/// Pause between two captured frames (frame rate control).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 30;

/// Pause between two QR decode attempts.
pub const DEFAULT_CODE_INTERVAL_MS: u64 = 250;

/// Upper bound for a single QR decode attempt.
pub const DEFAULT_DECODE_TIMEOUT_MS: u64 = 100;

/// Longest a producer waits for the frame slot before dropping its frame.
pub const DEFAULT_FRAME_PUT_TIMEOUT_MS: u64 = 100;

/// How long `Success` is held before the full reset.
pub const DEFAULT_SUCCESS_HOLD_MS: u64 = 30_000;

/// Upper bound for a complete enrollment job.
pub const DEFAULT_ENROLL_TIMEOUT_MS: u64 = 60_000;

/// Pause between two image polls while waiting for a finger during enrollment.
pub const ENROLL_IMAGE_POLL_MS: u64 = 50;

/// Default JPEG quality passed to the encoder (0-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 60;

// ============================================================================
// Status Payloads
// ============================================================================

/// Payload published when a fingerprint unlocked the kiosk.
pub const MSG_SCAN_QR: &str = "Fingerprint OK. Scan QR Code...";

/// Payload published after a successful enrollment.
pub const MSG_ENROLL_SUCCESS: &str = "Success Registration";

/// Payload published after a failed enrollment.
pub const MSG_ENROLL_FAILED: &str = "Registration failed";

/// Payload of a freshly reset kiosk.
pub const MSG_EMPTY: &str = "";
