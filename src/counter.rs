// Counter store accessor
// Read-or-initialize, increment and upsert for each named counter.
//
// Each counter is an independent read then write with no concurrency token,
// so two invocations racing on one id can both write N+1 (lost update).
// A failure on a later counter does not roll back earlier ones.
//
// Numan Thabit 2025 Nov

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::CounterError;
use crate::store::{CounterDocument, CounterStore, ReadOutcome};

pub const TOTAL_ID: &str = "visitorCount";

/// Counter ids touched by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterIds {
    pub total: String,
    pub daily: String,
}

impl CounterIds {
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            total: TOTAL_ID.to_string(),
            daily: daily_id(day),
        }
    }
}

pub fn daily_id(day: NaiveDate) -> String {
    format!("daily_{}", day.format("%Y-%m-%d"))
}

pub struct CounterAccessor<'a> {
    store: &'a dyn CounterStore,
}

impl<'a> CounterAccessor<'a> {
    pub fn new(store: &'a dyn CounterStore) -> Self {
        Self { store }
    }

    pub async fn read_or_init(&self, id: &str) -> Result<CounterDocument, CounterError> {
        match self.store.read(id).await? {
            ReadOutcome::Found(doc) => Ok(doc),
            ReadOutcome::NotFound => Ok(CounterDocument::zero(id)),
        }
    }

    /// Increment one counter and return its new value.
    pub async fn increment(&self, id: &str) -> Result<u64, CounterError> {
        let mut doc = self.read_or_init(id).await?;
        doc.count = doc.count.saturating_add(1);
        self.store.upsert(&doc).await?;
        debug!(id = %id, count = doc.count, "counter upserted");
        Ok(doc.count)
    }

    /// Increment counters in order; stops at the first failure.
    pub async fn increment_all(&self, ids: &[&str]) -> Result<Vec<u64>, CounterError> {
        let mut counts = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            match self.increment(id).await {
                Ok(count) => counts.push(count),
                Err(err) => {
                    if i > 0 {
                        warn!(
                            committed = ?&ids[..i],
                            failed = %id,
                            error = %err,
                            "partial counter update"
                        );
                    }
                    return Err(err);
                }
            }
        }
        Ok(counts)
    }
}
