//! Gatherers: single-call data producers sampled periodically by the supervisor.
//!
//! A [`Gatherer`] returns a typed, serializable payload. The supervisor only
//! ever sees gatherers through the object-safe [`AnyGatherer`], which erases
//! the payload into a `serde_json::Value` and lets observers downcast back to
//! the concrete gatherer when they need to.

mod cpu;
mod disk;
mod ram;

use std::any::Any;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::procfs::ParseError;

pub use cpu::{Cpu, CpuStats};
pub use disk::{Disk, DiskStats};
pub use ram::{Ram, RamStats};

/// Error returned by a failed sampling attempt.
#[derive(Debug)]
pub enum GatherError {
    /// A counter source could not be read.
    Io { path: PathBuf, source: io::Error },
    /// A counter source was read but its contents were malformed.
    Parse(ParseError),
    /// The payload could not be converted into a serializable value.
    Encode(serde_json::Error),
    /// The gatherer panicked while sampling.
    Panicked,
    /// Any other gatherer-specific failure.
    Other(String),
}

impl GatherError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl std::fmt::Display for GatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "gatherers: failed to read {}: {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "gatherers: {}", e),
            Self::Encode(e) => write!(f, "gatherers: failed to encode payload: {}", e),
            Self::Panicked => write!(f, "gatherers: gatherer panicked"),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GatherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Panicked | Self::Other(_) => None,
        }
    }
}

impl From<ParseError> for GatherError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// A periodically sampled data producer.
///
/// `gather` is called once per scheduling cycle from a blocking thread, so it
/// may perform blocking I/O. Any state carried between samples (for example
/// the previous counters needed for a delta) lives behind interior mutability
/// inside the gatherer.
pub trait Gatherer: Send + Sync + 'static {
    type Output: Serialize;

    fn gather(&self) -> Result<Self::Output, GatherError>;
}

/// Object-safe view of a [`Gatherer`] with its payload erased.
pub trait AnyGatherer: Send + Sync {
    /// Samples once and converts the payload into a JSON value.
    fn sample(&self) -> Result<Value, GatherError>;

    /// Name of the concrete gatherer type, for logging.
    fn type_name(&self) -> &'static str;

    /// Allows observers to downcast to the concrete gatherer.
    fn as_any(&self) -> &dyn Any;
}

impl<G: Gatherer> AnyGatherer for G {
    fn sample(&self) -> Result<Value, GatherError> {
        let output = self.gather()?;
        serde_json::to_value(output).map_err(GatherError::Encode)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<G>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Gatherer backed by a closure. Created with [`from_fn`].
pub struct FnGatherer<F> {
    f: F,
}

impl<F, T> Gatherer for FnGatherer<F>
where
    F: Fn() -> Result<T, GatherError> + Send + Sync + 'static,
    T: Serialize,
{
    type Output = T;

    fn gather(&self) -> Result<T, GatherError> {
        (self.f)()
    }
}

/// Wraps a closure into a [`Gatherer`].
///
/// ```
/// use monitroid_core::gatherer::{AnyGatherer, from_fn};
///
/// let answer = from_fn(|| Ok(42));
/// assert_eq!(answer.sample().unwrap(), serde_json::json!(42));
/// ```
pub fn from_fn<F, T>(f: F) -> FnGatherer<F>
where
    F: Fn() -> Result<T, GatherError> + Send + Sync + 'static,
    T: Serialize,
{
    FnGatherer { f }
}
