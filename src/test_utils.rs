// Test helpers
// In-memory counter store with failure injection and a connector spy
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::StoreSettings;
use crate::errors::CounterError;
use crate::store::{CounterDocument, CounterStore, ReadOutcome, StoreConnector};

#[derive(Debug, Clone)]
pub enum FailOn {
    Read(String, u16),
    Upsert(String, u16),
}

#[derive(Default)]
struct Inner {
    docs: HashMap<String, CounterDocument>,
    fail: Option<FailOn>,
    reads: Vec<String>,
    upserts: usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn with_counts(counts: &[(&str, u64)]) -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.lock().unwrap();
            for (id, count) in counts {
                inner.docs.insert(
                    id.to_string(),
                    CounterDocument {
                        id: id.to_string(),
                        count: *count,
                    },
                );
            }
        }
        store
    }

    pub fn failing(self, fail: FailOn) -> Self {
        self.inner.lock().unwrap().fail = Some(fail);
        self
    }

    pub fn count(&self, id: &str) -> Option<u64> {
        self.inner.lock().unwrap().docs.get(id).map(|d| d.count)
    }

    pub fn reads(&self) -> Vec<String> {
        self.inner.lock().unwrap().reads.clone()
    }

    pub fn upserts(&self) -> usize {
        self.inner.lock().unwrap().upserts
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn read(&self, id: &str) -> Result<ReadOutcome, CounterError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads.push(id.to_string());
        if let Some(FailOn::Read(fail_id, code)) = &inner.fail {
            if fail_id == id {
                return Err(CounterError::StoreRead {
                    message: format!("http {code} reading {id}"),
                    code: Some(*code),
                    extra: None,
                });
            }
        }
        Ok(match inner.docs.get(id) {
            Some(doc) => ReadOutcome::Found(doc.clone()),
            None => ReadOutcome::NotFound,
        })
    }

    async fn upsert(&self, doc: &CounterDocument) -> Result<(), CounterError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(FailOn::Upsert(fail_id, code)) = &inner.fail {
            if *fail_id == doc.id {
                return Err(CounterError::StoreWrite {
                    message: format!("http {code} writing {}", doc.id),
                    code: Some(*code),
                    extra: Some("Request rate is large".to_string()),
                });
            }
        }
        inner.upserts += 1;
        inner.docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }
}

/// Connector that records how often it was asked for a store.
pub struct SpyConnector {
    store: MemoryStore,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl SpyConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn broken(reason: &str) -> Self {
        Self {
            store: MemoryStore::default(),
            fail_with: Some(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for SpyConnector {
    async fn connect(
        &self,
        _settings: &StoreSettings,
    ) -> Result<Arc<dyn CounterStore>, CounterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(CounterError::connect(reason.clone())),
            None => Ok(Arc::new(self.store.clone())),
        }
    }
}
