use std::io;

/// Errors returned by the [`Supervisor`](super::Supervisor) API.
///
/// Registration errors are programmer errors: callers are expected to treat
/// them as fatal rather than retry.
#[derive(Debug)]
pub enum SupervisorError {
    /// A gatherer with this name is already registered.
    DuplicateName(String),
    /// A gatherer was registered with a zero sampling interval.
    ZeroInterval(String),
    /// A gatherer was registered after `stop()`.
    Stopped(String),
    /// The snapshot could not be encoded.
    Encode(serde_json::Error),
    /// The encoded snapshot could not be written to the sink.
    Io(io::Error),
}

impl std::fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => {
                write!(f, "supervisor: gatherer with name '{}' already registered", name)
            }
            Self::ZeroInterval(name) => {
                write!(f, "supervisor: gatherer '{}' has a zero interval", name)
            }
            Self::Stopped(name) => {
                write!(f, "supervisor: cannot register '{}' after stop", name)
            }
            Self::Encode(e) => write!(f, "supervisor: failed to encode json: {}", e),
            Self::Io(e) => write!(f, "supervisor: failed to write json: {}", e),
        }
    }
}

impl std::error::Error for SupervisorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
