//! Error types for the ski bus kernel.
//!
//! Every error here is a setup or environment failure. The protocol itself
//! never reaches an invalid state, so nothing is retried.

use thiserror::Error;

/// A CLI parameter outside its permitted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("number of skiers (L) must be between 0 and 19999, got {0}")]
    Skiers(i64),

    #[error("number of stops (Z) must be between 1 and 10, got {0}")]
    Stops(i64),

    #[error("bus capacity (K) must be between 10 and 100, got {0}")]
    Capacity(i64),

    #[error("maximum walking time (TL) must be between 0 and 10000 microseconds, got {0}")]
    WalkTime(i64),

    #[error("maximum travel time (TB) must be between 0 and 1000 microseconds, got {0}")]
    TravelTime(i64),
}

/// Unified simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid parameters, detected before any resource is allocated
    #[error("invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    /// A shared resource could not be created
    #[error("failed to initialize {resource}: {source}")]
    ResourceInit {
        resource: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// An actor task could not be started or terminated abnormally
    #[error("actor {actor} failed: {reason}")]
    Spawn { actor: String, reason: String },

    /// Writing to the action log failed
    #[error("failed to write action log: {0}")]
    LogWrite(#[source] std::io::Error),

    /// A semaphore was closed while an actor was blocked on it
    #[error("{channel} channel closed during the run")]
    ChannelClosed { channel: &'static str },
}

impl SimError {
    /// Short, stable identifier for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Argument(_) => "ARGUMENT_ERROR",
            Self::ResourceInit { .. } => "RESOURCE_INIT_ERROR",
            Self::Spawn { .. } => "SPAWN_ERROR",
            Self::LogWrite(_) => "LOG_WRITE_ERROR",
            Self::ChannelClosed { .. } => "CHANNEL_CLOSED",
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_converts() {
        let err: SimError = ArgumentError::Stops(0).into();
        assert_eq!(err.code(), "ARGUMENT_ERROR");
        assert!(err.to_string().contains("between 1 and 10"));
    }

    #[test]
    fn test_resource_init_names_resource() {
        let err = SimError::ResourceInit {
            resource: "action log",
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to initialize action log: denied");
    }
}
