//! Session configuration.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Selects the pipeline stages and validation of a [`Session`](crate::session::Session).
///
/// Missing fields take their defaults when decoding, so configs written by
/// an older front end stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reduce definitions after sharing and wrap the generator in `Reducing`.
    pub reduce: bool,
    /// Saturate silent steps with `Weak`.
    pub weak: bool,
    /// Fail session construction when a definition is unguarded.
    pub reject_unguarded: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reduce: true,
            weak: false,
            reject_unguarded: true,
        }
    }
}

impl EngineConfig {
    /// Strict successors only, no reduction, unguarded definitions allowed.
    pub fn strict() -> Self {
        Self {
            reduce: false,
            weak: false,
            reject_unguarded: false,
        }
    }

    /// Default config with weak saturation.
    pub fn weak() -> Self {
        Self {
            weak: true,
            ..Self::default()
        }
    }

    /// Encodes the config as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, EngineError> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Decodes a config from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, EngineError> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}
