//! Versioned outcome of a gatherer's most recent sample.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use crate::gatherer::GatherError;

/// What the latest sampling attempt produced.
#[derive(Debug, Clone, Default)]
pub enum Outcome {
    /// Registered, but no sample has completed yet.
    #[default]
    NotReady,
    Success(Arc<Value>),
    Failure(Arc<GatherError>),
}

/// Latest outcome of one gatherer together with its generation.
///
/// The generation counts sampling attempts: it is 0 while the gatherer is not
/// ready and increases by exactly one per attempt, successful or not.
#[derive(Debug, Clone, Default)]
pub struct GatherResult {
    generation: u64,
    outcome: Outcome,
}

impl GatherResult {
    pub(crate) fn new(generation: u64, outcome: Outcome) -> Self {
        Self {
            generation,
            outcome,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self.outcome, Outcome::NotReady)
    }

    pub fn success(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(&**value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GatherError> {
        match &self.outcome {
            Outcome::Failure(err) => Some(&**err),
            _ => None,
        }
    }
}

/// Serialized as `{"generation", "ready", "success", "error"}`; absent
/// payloads are `null` and the error is its message text.
impl Serialize for GatherResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GatherResult", 4)?;
        state.serialize_field("generation", &self.generation)?;
        state.serialize_field("ready", &self.is_ready())?;
        state.serialize_field("success", &self.success())?;
        state.serialize_field("error", &self.error().map(|e| e.to_string()))?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_ready_serialization() {
        let result = GatherResult::default();
        assert!(!result.is_ready());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"generation": 0, "ready": false, "success": null, "error": null})
        );
    }

    #[test]
    fn test_success_serialization() {
        let result = GatherResult::new(3, Outcome::Success(Arc::new(json!({"usage": 0.25}))));
        assert!(result.is_ready());
        assert!(result.error().is_none());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"generation": 3, "ready": true, "success": {"usage": 0.25}, "error": null})
        );
    }

    #[test]
    fn test_failure_serialization() {
        let result = GatherResult::new(
            7,
            Outcome::Failure(Arc::new(GatherError::other("sensor offline"))),
        );
        assert!(result.success().is_none());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"generation": 7, "ready": true, "success": null, "error": "sensor offline"})
        );
    }
}
