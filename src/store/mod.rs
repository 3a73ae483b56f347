// Counter document store abstraction
// Defines the document shape, the read outcome, and the traits the accessor
// and service talk to. The Cosmos REST client is the production backend
//
// Numan Thabit 2025 Nov

pub mod cosmos;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::config::StoreSettings;
use crate::errors::CounterError;

pub use cosmos::CosmosConnector;

/// A persisted counter. `id` is also the partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDocument {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

impl CounterDocument {
    pub fn zero(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            count: 0,
        }
    }
}

/// Result of a point read: a missing document is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(CounterDocument),
    NotFound,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn read(&self, id: &str) -> Result<ReadOutcome, CounterError>;

    /// Create or replace the document, partitioned on its id.
    async fn upsert(&self, doc: &CounterDocument) -> Result<(), CounterError>;
}

/// Builds a store client for one invocation.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, settings: &StoreSettings)
        -> Result<Arc<dyn CounterStore>, CounterError>;
}

// The store is schema-less, so anything that is not a finite non-negative
// number reads as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

pub fn coerce_count(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f >= 0.0 => f.trunc() as u64,
                    _ => 0,
                }
            }
        }
        _ => 0,
    }
}
