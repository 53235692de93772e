use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Sensor errors
    #[error("Sensor not ready: {0}")]
    SensorTransient(String),

    #[error("Sensor fault: {0}")]
    SensorFault(String),

    // State machine errors
    #[error("Invalid transition: {event} is not accepted in state {state}")]
    InvalidTransition { state: String, event: String },

    #[error("Kiosk busy in state {state}")]
    Busy { state: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    // Payload errors
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Collaborator errors
    #[error("External call failed: {0}")]
    ExternalCallFailure(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhaustion(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for faults that are retried on the next worker cycle
    /// without any observable effect.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::SensorTransient(_) | Error::ResourceExhaustion(_) | Error::MalformedPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let error = Error::InvalidTransition {
            state: "SUCCESS".to_string(),
            event: "biometric_match".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid transition: biometric_match is not accepted in state SUCCESS"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::SensorTransient("no finger".into()).is_transient());
        assert!(Error::ResourceExhaustion("frame copy".into()).is_transient());
        assert!(!Error::SensorFault("uart".into()).is_transient());
        assert!(
            !Error::Busy {
                state: "SCANNING".into()
            }
            .is_transient()
        );
    }
}
