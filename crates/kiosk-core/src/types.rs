use crate::{
    Result,
    constants::{
        MAX_ENROLLMENT_ID, MIN_ENROLLMENT_ID, QR_FIELD_DELIMITER, QR_ID_DELIMITER,
        QR_TICKET_FIELD_INDEX,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level state of the kiosk.
///
/// Exactly one state is active at any instant. Serialized in upper case
/// (`"LOCKED"`, `"SCANNING"`, ...) for the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    /// Waiting for a fingerprint.
    Locked,
    /// Fingerprint accepted, camera streaming and QR decoding active.
    Scanning,
    /// QR ticket accepted; held until the full reset.
    Success,
    /// A fingerprint enrollment job owns the sensor.
    Enrolling,
}

impl SystemState {
    /// Upper-case wire name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SystemState::Locked => "LOCKED",
            SystemState::Scanning => "SCANNING",
            SystemState::Success => "SUCCESS",
            SystemState::Enrolling => "ENROLLING",
        }
    }

    /// Returns `true` while the camera pipeline may publish frames.
    #[inline]
    #[must_use]
    pub fn is_scanning(self) -> bool {
        matches!(self, SystemState::Scanning)
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consistent `(state, payload)` pair.
///
/// Both fields are always written together; a reader never observes the
/// state of one update paired with the payload of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub state: SystemState,
    pub payload: String,
}

impl StatusRecord {
    #[must_use]
    pub fn new(state: SystemState, payload: impl Into<String>) -> Self {
        Self {
            state,
            payload: payload.into(),
        }
    }
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self::new(SystemState::Locked, String::new())
    }
}

/// Template id reported by the fingerprint sensor on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u16);

impl UserId {
    #[must_use]
    pub fn new(id: u16) -> Self {
        UserId(id)
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sensor template slot targeted by an enrollment (1-127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollmentId(u8);

impl EnrollmentId {
    /// Create a new enrollment id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the id is outside 1-127.
    pub fn new(id: i64) -> Result<Self> {
        if !(i64::from(MIN_ENROLLMENT_ID)..=i64::from(MAX_ENROLLMENT_ID)).contains(&id) {
            return Err(Error::InvalidArgument(format!(
                "Enrollment id must be {MIN_ENROLLMENT_ID}-{MAX_ENROLLMENT_ID}, got {id}"
            )));
        }
        // Range checked above, the cast cannot truncate.
        Ok(EnrollmentId(id as u8))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EnrollmentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("Invalid enrollment id: {s}")))?;
        EnrollmentId::new(id)
    }
}

/// The user unlocked by the last fingerprint match.
///
/// Lives from the biometric match until the full reset and is only used to
/// annotate the record update sent after a successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub user_id: UserId,
    /// Random id forwarded with the record update so the remote side can
    /// correlate repeated submissions of the same session.
    pub session_id: Uuid,
    pub authenticated_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            session_id: Uuid::new_v4(),
            authenticated_at: Utc::now(),
        }
    }
}

/// Parsed QR ticket: `<prefix>;<laptop-id>-<name>[;...]`.
///
/// # Examples
///
/// ```
/// use kiosk_core::LaptopTicket;
///
/// let ticket: LaptopTicket = "1;42-LaptopA".parse().unwrap();
/// assert_eq!(ticket.laptop_id, 42);
/// assert_eq!(ticket.name, "LaptopA");
///
/// assert!("42-LaptopA".parse::<LaptopTicket>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaptopTicket {
    /// The payload exactly as decoded.
    pub raw: String,
    /// First field of the record, kept opaque.
    pub prefix: String,
    pub laptop_id: u32,
    pub name: String,
}

impl LaptopTicket {
    /// Parse a decoded QR payload.
    ///
    /// # Errors
    /// Returns `Error::MalformedPayload` if the second field is missing or is
    /// not `<integer-id>-<name>` with a non-empty name.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut fields = raw.split(QR_FIELD_DELIMITER);
        let prefix = fields.next().unwrap_or_default();
        let ticket = fields
            .nth(QR_TICKET_FIELD_INDEX - 1)
            .ok_or_else(|| Error::MalformedPayload(format!("Missing ticket field: {raw:?}")))?
            .trim();

        let (id, name) = ticket.split_once(QR_ID_DELIMITER).ok_or_else(|| {
            Error::MalformedPayload(format!("Ticket field is not <id>-<name>: {ticket:?}"))
        })?;

        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedPayload(format!("Invalid laptop id: {id:?}")));
        }
        let laptop_id: u32 = id
            .parse()
            .map_err(|_| Error::MalformedPayload(format!("Laptop id out of range: {id}")))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MalformedPayload("Empty laptop name".to_string()));
        }

        Ok(LaptopTicket {
            raw: raw.to_string(),
            prefix: prefix.to_string(),
            laptop_id,
            name: name.to_string(),
        })
    }
}

impl std::str::FromStr for LaptopTicket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LaptopTicket::parse(s)
    }
}
