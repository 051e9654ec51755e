//! Log-and-continue persistence wrapper
//!
//! The crawler never stops on a failed write. `PersistenceSink` forwards to a
//! `Storage` backend and turns every error into an `error!` log line.

use crate::extract::EntityKind;
use crate::storage::{Record, Storage};

/// Wraps a storage backend so persistence failures never interrupt a crawl
pub struct PersistenceSink<S: Storage> {
    storage: S,
    failures: u64,
}

impl<S: Storage> PersistenceSink<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            failures: 0,
        }
    }

    /// Upserts one record; returns whether it was written
    pub fn upsert_one(&mut self, kind: EntityKind, record: impl Into<Record>) -> bool {
        let record = record.into();
        match self.storage.upsert_one(kind, &record) {
            Ok(()) => true,
            Err(e) => {
                self.failures += 1;
                tracing::error!(
                    "Failed to persist {} {}: {}",
                    kind,
                    record.primary_key(),
                    e
                );
                false
            }
        }
    }

    /// Upserts a batch; returns the number of records written
    pub fn upsert_batch(&mut self, kind: EntityKind, records: &[Record]) -> usize {
        match self.storage.upsert_batch(kind, records) {
            Ok(written) => written,
            Err(e) => {
                self.failures += 1;
                tracing::error!(
                    "Failed to persist batch of {} {} records: {}",
                    records.len(),
                    kind,
                    e
                );
                0
            }
        }
    }

    /// Number of writes that failed since construction
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}
