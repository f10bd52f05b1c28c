//! Untyped payloads passed through `begin`/`end`.
//!
//! The orchestrator forwards payloads without looking at them. Controllers
//! decode what they expect and decide for themselves what a bad shape means.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("payload is not a valid {expected}: {source}")]
    Decode {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Opaque data handed to a controller on `begin` or returned from `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowData(Value);

impl FlowData {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn encode<T: Serialize>(value: &T) -> Result<Self, PayloadError> {
        serde_json::to_value(value)
            .map(Self)
            .map_err(PayloadError::Encode)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        T::deserialize(&self.0).map_err(|source| PayloadError::Decode {
            expected: std::any::type_name::<T>(),
            source,
        })
    }

    /// Top-level field lookup for object payloads.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for FlowData {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
