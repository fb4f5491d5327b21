// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque executor state captured at interruption

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("executor snapshot does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Backend-defined state that lets a new executor instance pick up an
/// in-flight stage. The engine never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutorSnapshot(serde_json::Value);

impl ExecutorSnapshot {
    pub fn encode<T: Serialize>(state: &T) -> Result<Self, SnapshotError> {
        Ok(Self(serde_json::to_value(state)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SnapshotError> {
        Ok(T::deserialize(&self.0)?)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for ExecutorSnapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
